use http::Uri;

use super::error::DirectoryError;

/// 拼出 `协议://地址:端口` 形式的主机串
pub(crate) fn prepare_host(protocol: &str, address: &str, port: u16) -> String {
    format!("{protocol}://{address}:{port}")
}

/// 代理后方的主机串，地址本身已含路由信息，不带端口
pub(crate) fn prepare_proxied_host(protocol: &str, address: &str) -> String {
    format!("{protocol}://{address}")
}

// 单个服务端点的缓存条目
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    name: String,
    path: String,
    address: String,
    port: u16,
    // 目录记录的最近版本号，0 表示尚未解析
    last_version: u64,
    url: Option<Uri>,
}

impl ServiceEndpoint {
    /// 登记一个尚未解析的端点，地址与端口由后续目录同步填入
    pub fn register(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            address: String::new(),
            port: 0,
            last_version: 0,
            url: None,
        }
    }

    /// 用已知地址构造端点，立即解析 URL
    pub fn with_address(name: &str, address: &str, port: u16) -> Result<Self, DirectoryError> {
        let host = prepare_host("http", address, port);
        let url: Uri = host.parse().map_err(|source| DirectoryError::InvalidUrl {
            service: name.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.to_string(),
            path: String::new(),
            address: address.to_string(),
            port,
            last_version: 0,
            url: Some(url),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn last_version(&self) -> u64 {
        self.last_version
    }

    /// 端点是否已经从目录解析出位置
    pub fn is_resolved(&self) -> bool {
        !self.address.is_empty() && self.url.is_some()
    }

    /// 已解析的 URL，未解析返回 None
    pub fn url(&self) -> Option<&Uri> {
        self.url.as_ref()
    }

    /// 默认协议的主机串，未解析返回 None
    pub fn host(&self) -> Option<String> {
        self.is_resolved()
            .then(|| prepare_host("http", &self.address, self.port))
    }

    /// 指定协议的主机串，未解析返回空串
    pub fn host_string(&self, protocol: &str) -> String {
        if !self.is_resolved() {
            return String::new();
        }
        prepare_host(protocol, &self.address, self.port)
    }

    /// 指定协议并追加路径后缀的主机串，未解析返回空串
    pub fn host_string_with_suffix(&self, protocol: &str, suffix: &str) -> String {
        if !self.is_resolved() {
            return String::new();
        }
        format!(
            "{}/{}/",
            prepare_host(protocol, &self.address, self.port),
            suffix
        )
    }

    // 由目录同步调用：写入新的位置并重算 URL
    pub(crate) fn apply_location(
        &mut self,
        address: &str,
        port: u16,
        version: u64,
        behind_proxy: bool,
    ) -> Result<(), DirectoryError> {
        let host = if behind_proxy {
            prepare_proxied_host("http", address)
        } else {
            prepare_host("http", address, port)
        };

        let url: Uri = host.parse().map_err(|source| DirectoryError::InvalidUrl {
            service: self.name.clone(),
            source,
        })?;

        self.address = address.to_string();
        self.port = port;
        self.last_version = version;
        self.url = Some(url);
        Ok(())
    }
}
