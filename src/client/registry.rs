use async_trait::async_trait;

use super::error::RegistryError;
use super::types::{CatalogRecord, HealthStatus, KvListing, ServiceDescriptor};

/// 注册中心的远程接口
///
/// 传输层由实现方负责，本 crate 只依赖这个 trait。
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 注册一个服务实例
    async fn register(&self, descriptor: ServiceDescriptor) -> Result<(), RegistryError>;

    /// 注销一个服务实例
    async fn deregister(&self, service_name: &str) -> Result<(), RegistryError>;

    /// 上报 TTL 健康检查状态
    async fn update_ttl(
        &self,
        check_id: &str,
        note: &str,
        status: HealthStatus,
    ) -> Result<(), RegistryError>;

    /// 列举指定前缀下的全部键值
    ///
    /// 携带 `wait_index` 时为长轮询：阻塞直到前缀版本超过 `wait_index`，
    /// 或注册中心侧的最大等待时间到期后返回当前内容。
    async fn list_prefix(
        &self,
        prefix: &str,
        wait_index: Option<u64>,
    ) -> Result<KvListing, RegistryError>;

    /// 按环境标签查询服务目录记录
    async fn catalog_service(
        &self,
        service_name: &str,
        env_tag: &str,
    ) -> Result<Vec<CatalogRecord>, RegistryError>;
}
