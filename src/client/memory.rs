use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use tokio::time::Instant;
use uuid::Uuid;

use super::error::RegistryError;
use super::registry::RegistryClient;
use super::types::{CatalogRecord, HealthStatus, KvListing, KvPair, ServiceDescriptor};

// 已注册的服务实例
#[derive(Debug, Clone)]
pub struct RegisteredService {
    pub service_id: String,
    pub descriptor: ServiceDescriptor,
    pub modify_index: u64,
    /// 最近一次上报的健康状态与说明
    pub last_status: Option<(HealthStatus, String)>,
}

// 键值存储状态，整体由一把读写锁保护
#[derive(Debug, Default)]
struct KvState {
    pairs: BTreeMap<String, KvPair>,
    last_index: u64,
}

/// 进程内注册中心实现
///
/// 为集成测试和本地开发提供真实的长轮询语义，不经过网络。
#[derive(Debug)]
pub struct InMemoryRegistry {
    services: DashMap<String, RegisteredService>,
    kv: RwLock<KvState>,
    // 全局单调递增版本号，服务目录与键值存储共用
    index: AtomicU64,
    // 键值版本广播，长轮询在这上面等待，不会丢失唤醒
    index_tx: watch::Sender<u64>,
    // 长轮询的最大等待时间
    max_wait: Duration,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl InMemoryRegistry {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            services: DashMap::new(),
            kv: RwLock::new(KvState::default()),
            index: AtomicU64::new(0),
            index_tx: watch::Sender::new(0),
            max_wait,
        }
    }

    fn next_index(&self) -> u64 {
        self.index.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 写入一个键值，版本号前进并唤醒所有长轮询调用方
    pub async fn put(&self, key: &str, value: &str) {
        let index = self.next_index();
        let mut kv = self.kv.write().await;
        let create_version = kv
            .pairs
            .get(key)
            .map(|pair| pair.create_version)
            .unwrap_or(index);

        kv.pairs.insert(
            key.to_string(),
            KvPair {
                key: key.to_string(),
                value: value.to_string(),
                create_version,
                modify_version: index,
            },
        );
        kv.last_index = index;
        drop(kv);

        self.index_tx.send_replace(index);
    }

    /// 删除一个键
    pub async fn remove(&self, key: &str) {
        let index = self.next_index();
        let mut kv = self.kv.write().await;
        if kv.pairs.remove(key).is_some() {
            kv.last_index = index;
            drop(kv);
            self.index_tx.send_replace(index);
        }
    }

    /// 修改已注册服务的位置，模拟服务迁移
    pub fn set_service_address(&self, service_name: &str, address: &str, port: u16) -> bool {
        if let Some(mut service) = self.services.get_mut(service_name) {
            service.descriptor.address = address.to_string();
            service.descriptor.port = port;
            service.modify_index = self.next_index();
            true
        } else {
            false
        }
    }

    pub fn is_registered(&self, service_name: &str) -> bool {
        self.services.contains_key(service_name)
    }

    /// 最近一次上报的健康状态
    pub fn last_status(&self, service_name: &str) -> Option<(HealthStatus, String)> {
        self.services
            .get(service_name)
            .and_then(|service| service.last_status.clone())
    }

    fn snapshot(state: &KvState, prefix: &str) -> KvListing {
        let pairs = state
            .pairs
            .values()
            .filter(|pair| pair.key.starts_with(prefix))
            .cloned()
            .collect();

        KvListing {
            pairs,
            last_index: state.last_index,
        }
    }
}

#[async_trait]
impl RegistryClient for InMemoryRegistry {
    async fn register(&self, descriptor: ServiceDescriptor) -> Result<(), RegistryError> {
        let service = RegisteredService {
            service_id: Uuid::new_v4().to_string(),
            modify_index: self.next_index(),
            last_status: None,
            descriptor,
        };

        tracing::info!(
            service_name = %service.descriptor.name,
            service_id = %service.service_id,
            "Registered service in memory registry"
        );

        self.services
            .insert(service.descriptor.name.clone(), service);
        Ok(())
    }

    async fn deregister(&self, service_name: &str) -> Result<(), RegistryError> {
        if self.services.remove(service_name).is_none() {
            return Err(RegistryError::ServiceNotFound(service_name.to_string()));
        }
        Ok(())
    }

    async fn update_ttl(
        &self,
        check_id: &str,
        note: &str,
        status: HealthStatus,
    ) -> Result<(), RegistryError> {
        // 检查标识符约定为 service:<服务名>
        let service_name = check_id
            .strip_prefix("service:")
            .ok_or_else(|| RegistryError::InvalidResponse(format!("bad check id: {check_id}")))?;

        let mut service = self
            .services
            .get_mut(service_name)
            .ok_or_else(|| RegistryError::ServiceNotFound(service_name.to_string()))?;

        service.last_status = Some((status, note.to_string()));
        Ok(())
    }

    async fn list_prefix(
        &self,
        prefix: &str,
        wait_index: Option<u64>,
    ) -> Result<KvListing, RegistryError> {
        if let Some(wait) = wait_index {
            let mut rx = self.index_tx.subscribe();
            let deadline = Instant::now() + self.max_wait;
            loop {
                if *rx.borrow_and_update() > wait {
                    break;
                }

                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match tokio::time::timeout(remaining, rx.changed()).await {
                    Ok(Ok(())) => continue,
                    // 最大等待时间到期，按长轮询语义返回当前内容
                    _ => break,
                }
            }
        }

        let kv = self.kv.read().await;
        Ok(Self::snapshot(&kv, prefix))
    }

    async fn catalog_service(
        &self,
        service_name: &str,
        env_tag: &str,
    ) -> Result<Vec<CatalogRecord>, RegistryError> {
        let records = self
            .services
            .iter()
            .filter(|entry| {
                entry.value().descriptor.name == service_name
                    && entry
                        .value()
                        .descriptor
                        .tags
                        .iter()
                        .any(|tag| tag == env_tag)
            })
            .map(|entry| {
                let service = entry.value();
                CatalogRecord {
                    service_id: service.service_id.clone(),
                    address: service.descriptor.address.clone(),
                    port: service.descriptor.port,
                    tags: service.descriptor.tags.clone(),
                    modify_index: service.modify_index,
                }
            })
            .collect();

        Ok(records)
    }
}
