use std::net::IpAddr;

// EC2 实例元数据接口
const METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/local-ipv4";

/// 网络辅助错误类型
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed address in metadata response: {0}")]
    MalformedAddress(String),
}

/// 查询 EC2 元数据接口，返回实例的内网 IPv4 地址
pub async fn private_ipv4() -> Result<IpAddr, NetError> {
    let body = reqwest::get(METADATA_URL).await?.text().await?;
    parse_metadata_body(&body)
}

fn parse_metadata_body(body: &str) -> Result<IpAddr, NetError> {
    let trimmed = body.trim();
    trimmed
        .parse::<IpAddr>()
        .map_err(|_| NetError::MalformedAddress(trimmed.to_string()))
}
