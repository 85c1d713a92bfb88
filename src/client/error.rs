/// 注册中心客户端错误类型
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Timeout error")]
    Timeout,
    #[error("Service not found: {0}")]
    ServiceNotFound(String),
    #[error("Invalid response from registry: {0}")]
    InvalidResponse(String),
}
