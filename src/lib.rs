pub mod agent;
pub mod client;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod net;

pub use agent::RegistryAgent;
pub use client::{RegistryClient, RegistryError};
pub use config::AgentConfig;
pub use credentials::{CredentialGroup, CredentialStore, CredentialWatcher};
pub use directory::{ServiceDirectory, ServiceEndpoint};

/// 初始化日志订阅器，由宿主进程在启动时调用一次
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
