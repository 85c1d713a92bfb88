use crate::client::RegistryError;

/// 服务目录错误类型
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("services must be populated before updating")]
    NotPopulated,
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid endpoint url for service {service}: {source}")]
    InvalidUrl {
        service: String,
        source: http::uri::InvalidUri,
    },
}
