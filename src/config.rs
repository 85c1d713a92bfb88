use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("service name is not provided")]
    MissingServiceName,
    #[error("service address is not provided")]
    MissingServiceAddress,
    #[error("registry address is not provided")]
    MissingRegistryAddress,
    #[error("agent config has not been validated")]
    NotValidated,
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),
}

/// 代理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// 本服务名称
    pub service_name: String,
    /// 容器端口
    #[serde(default)]
    pub container_port: u16,
    /// 本服务地址
    pub address: String,
    /// 健康检查 TTL 秒数
    #[serde(default)]
    pub ttl_seconds: u64,
    /// 环境标签
    #[serde(default)]
    pub env: String,
    /// 注册中心地址
    pub registry_address: String,
    /// 注册中心端口
    #[serde(default)]
    pub registry_port: u16,
    /// 健康检查通过时上报的说明文本
    #[serde(default)]
    pub pass_phrase: String,
    /// 健康检查失败时上报的说明文本
    #[serde(default)]
    pub fail_phrase: String,

    #[serde(skip)]
    validated: bool,
}

impl AgentConfig {
    /// 从 TOML 配置文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// 从环境变量加载（REGISTRY_ 前缀），支持 .env 文件
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config: AgentConfig = envy::prefixed("REGISTRY_").from_env()?;
        Ok(config)
    }

    /// 校验必填字段并补全默认值
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::MissingServiceName);
        }

        if self.container_port == 0 {
            self.container_port = 9000;
        }

        if self.address.is_empty() {
            return Err(ConfigError::MissingServiceAddress);
        }

        if self.ttl_seconds == 0 {
            self.ttl_seconds = 15;
        }

        if self.env.is_empty() {
            self.env = "dev".to_string();
        }

        if self.registry_address.is_empty() {
            return Err(ConfigError::MissingRegistryAddress);
        }

        if self.registry_port == 0 {
            self.registry_port = 8500;
        }

        if self.pass_phrase.is_empty() {
            self.pass_phrase = "Service alive and reachable.".to_string();
        }

        if self.fail_phrase.is_empty() {
            self.fail_phrase = "Service unreachable.".to_string();
        }

        self.validated = true;
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// 健康检查 TTL
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// 注册中心完整地址
    pub fn registry_endpoint(&self) -> String {
        format!("{}:{}", self.registry_address, self.registry_port)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            container_port: 0,
            address: String::new(),
            ttl_seconds: 0,
            env: String::new(),
            registry_address: String::new(),
            registry_port: 0,
            pass_phrase: String::new(),
            fail_phrase: String::new(),
            validated: false,
        }
    }
}
