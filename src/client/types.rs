use std::time::Duration;

// 服务注册描述
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    /// TTL 型健康检查的超时时间
    pub check_ttl: Duration,
}

/// 健康检查上报状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn,
    Fail,
}

impl HealthStatus {
    /// 注册中心约定的状态字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Pass => "pass",
            HealthStatus::Warn => "warn",
            HealthStatus::Fail => "fail",
        }
    }
}

// 键值条目，携带注册中心分配的版本号
#[derive(Debug, Clone)]
pub struct KvPair {
    pub key: String,
    pub value: String,
    pub create_version: u64,
    pub modify_version: u64,
}

// 前缀列举结果
#[derive(Debug, Clone)]
pub struct KvListing {
    pub pairs: Vec<KvPair>,
    /// 整个前缀的最新版本号
    pub last_index: u64,
}

// 目录服务记录
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub service_id: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub modify_index: u64,
}

/// 服务健康检查标识符约定：`service:<服务名>`
pub fn check_id(service_name: &str) -> String {
    format!("service:{service_name}")
}
