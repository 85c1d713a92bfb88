use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::{CatalogRecord, RegistryClient};

use super::endpoint::ServiceEndpoint;
use super::error::DirectoryError;

// 目录内部状态，整体由一把读写锁保护
#[derive(Debug, Default)]
struct DirectoryState {
    entries: HashMap<String, ServiceEndpoint>,
    // 首次全量同步成功后置位，增量刷新依赖它
    populated: bool,
}

/// 对端服务目录缓存
///
/// 读取方拿到的是最近一次同步完成时的快照，不是实时查询。
pub struct ServiceDirectory {
    state: RwLock<DirectoryState>,
    client: Arc<dyn RegistryClient>,
}

impl ServiceDirectory {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            client,
        }
    }

    /// 带初始端点构造目录
    pub async fn with_endpoints(
        client: Arc<dyn RegistryClient>,
        endpoints: impl IntoIterator<Item = ServiceEndpoint>,
    ) -> Self {
        let directory = Self::new(client);
        for endpoint in endpoints {
            directory.add(endpoint).await;
        }
        directory
    }

    /// 登记端点，同名端点已存在时不覆盖
    pub async fn add(&self, endpoint: ServiceEndpoint) {
        let mut state = self.state.write().await;
        if state.entries.contains_key(endpoint.name()) {
            return;
        }
        state.entries.insert(endpoint.name().to_string(), endpoint);
    }

    pub async fn get(&self, name: &str) -> Option<ServiceEndpoint> {
        let state = self.state.read().await;
        state.entries.get(name).cloned()
    }

    pub async fn has(&self, name: &str) -> bool {
        let state = self.state.read().await;
        state.entries.contains_key(name)
    }

    pub async fn delete(&self, name: &str) {
        let mut state = self.state.write().await;
        state.entries.remove(name);
    }

    pub async fn is_populated(&self) -> bool {
        let state = self.state.read().await;
        state.populated
    }

    /// 全量同步：从服务目录解析所有已登记端点的位置
    ///
    /// 成功后目录进入 populated 状态。URL 解析失败会中断本次调用，
    /// 已应用的更新保持原样。
    pub async fn parse(&self, env: &str, behind_proxy: bool) -> Result<(), DirectoryError> {
        self.reconcile(env, behind_proxy).await?;

        let mut state = self.state.write().await;
        state.populated = true;
        Ok(())
    }

    /// 增量刷新：与 `parse` 同一套同步逻辑，但要求目录已完成首次全量同步
    pub async fn update(&self, env: &str, behind_proxy: bool) -> Result<(), DirectoryError> {
        if !self.is_populated().await {
            return Err(DirectoryError::NotPopulated);
        }
        self.reconcile(env, behind_proxy).await
    }

    async fn reconcile(&self, env: &str, behind_proxy: bool) -> Result<(), DirectoryError> {
        // 先在锁外取目录记录，避免跨远程调用持锁
        let names: Vec<String> = {
            let state = self.state.read().await;
            state.entries.keys().cloned().collect()
        };

        let mut catalogs: Vec<(String, Vec<CatalogRecord>)> = Vec::with_capacity(names.len());
        for name in names {
            let records = self.client.catalog_service(&name, env).await?;
            catalogs.push((name, records));
        }

        let mut state = self.state.write().await;
        for (name, records) in catalogs {
            let Some(entry) = state.entries.get_mut(&name) else {
                // 取目录期间端点被删除
                continue;
            };

            // 环境标签必须排在首位，位置不符的记录一律忽略
            let Some(record) = records
                .iter()
                .find(|record| record.tags.first().map(String::as_str) == Some(env))
            else {
                continue;
            };

            // 版本一致说明位置没有变化，保持缓存不动
            if record.modify_index == entry.last_version() {
                continue;
            }

            entry.apply_location(
                &record.address,
                record.port,
                record.modify_index,
                behind_proxy,
            )?;

            tracing::info!(
                service_name = %name,
                address = %record.address,
                port = record.port,
                version = record.modify_index,
                "Updated service endpoint from catalog"
            );
        }

        Ok(())
    }
}
