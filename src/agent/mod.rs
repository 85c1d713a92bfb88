//! Registry agent module
//!
//! This module contains the local-instance lifecycle split into logical components:
//! - `RegistryAgent`: registration, background-task lifecycle and shutdown
//! - `heartbeat`: the TTL heartbeat loop

pub mod heartbeat;

pub use heartbeat::HealthCheck;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::client::{RegistryClient, RegistryError, ServiceDescriptor};
use crate::config::{AgentConfig, ConfigError};
use crate::credentials::{CredentialGroup, CredentialStore, CredentialWatcher};

/// 代理错误类型
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// 本地服务实例代理
///
/// 负责向注册中心登记本实例，并托管心跳与凭证监听等后台循环。
pub struct RegistryAgent {
    config: AgentConfig,
    client: Arc<dyn RegistryClient>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl RegistryAgent {
    /// 注册本服务实例并返回代理
    ///
    /// 配置必须先通过 `validate`，否则直接拒绝。
    pub async fn new(
        config: AgentConfig,
        client: Arc<dyn RegistryClient>,
    ) -> Result<Self, AgentError> {
        if !config.is_validated() {
            return Err(AgentError::Config(ConfigError::NotValidated));
        }

        let descriptor = ServiceDescriptor {
            name: config.service_name.clone(),
            address: config.address.clone(),
            port: config.container_port,
            tags: vec![config.env.clone()],
            check_ttl: config.ttl(),
        };
        client.register(descriptor).await?;

        tracing::info!(
            service_name = %config.service_name,
            address = %config.address,
            port = config.container_port,
            env = %config.env,
            "Registered service with registry"
        );

        Ok(Self {
            config,
            client,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn client(&self) -> Arc<dyn RegistryClient> {
        self.client.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 在代理的任务追踪器下启动凭证监听循环
    pub fn spawn_credential_watch(
        &self,
        store: Arc<CredentialStore>,
        period: Duration,
        update_tx: mpsc::Sender<CredentialGroup>,
        error_tx: mpsc::Sender<RegistryError>,
    ) {
        let watcher = CredentialWatcher::with_cancellation(store, period, self.cancel.child_token());
        self.tasks.spawn(async move {
            watcher.run(update_tx, error_tx).await;
        });
    }

    /// 停机：取消所有后台循环，等待退出后注销本实例
    ///
    /// 后台循环里的长轮询与取消信号赛跑，等待时间有界。
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;

        if let Err(error) = self.client.deregister(&self.config.service_name).await {
            tracing::warn!(
                service_name = %self.config.service_name,
                error = %error,
                "Failed to deregister service during shutdown"
            );
        }
    }
}
