use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::{KvListing, RegistryClient, RegistryError};

// 单个凭证条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub key: String,
    pub value: String,
    /// 注册中心侧的条目版本号，0 表示从未观察到
    pub version: u64,
}

/// 一组逻辑上同属一个配置包的凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialGroup {
    pub name: String,
    pub entries: Vec<CredentialEntry>,
}

impl CredentialGroup {
    /// 用预期的键集合创建凭证组，值为空、版本为 0
    pub fn new<I, S>(name: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = keys
            .into_iter()
            .map(|key| CredentialEntry {
                key: key.into(),
                value: String::new(),
                version: 0,
            })
            .collect();

        Self {
            name: name.to_string(),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

// 存储内部状态，整体由一把读写锁保护
#[derive(Debug, Default)]
struct StoreState {
    // 被监听前缀的最近全局版本号，只前进不回退
    global_version: u64,
    groups: Vec<CredentialGroup>,
}

/// 凭证缓存
///
/// 构造后凭证组集合固定，唯一的写入方是同步逻辑；
/// 读取方在共享读锁下总能看到某次完整同步后的快照。
pub struct CredentialStore {
    service_name: String,
    env: String,
    state: RwLock<StoreState>,
    client: Arc<dyn RegistryClient>,
}

impl CredentialStore {
    pub fn new(
        client: Arc<dyn RegistryClient>,
        service_name: &str,
        env: &str,
        groups: Vec<CredentialGroup>,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            env: env.to_string(),
            state: RwLock::new(StoreState {
                global_version: 0,
                groups,
            }),
            client,
        }
    }

    /// 注册中心里的键前缀：`<服务名>/<环境>/`
    pub fn key_prefix(&self) -> String {
        format!("{}/{}/", self.service_name, self.env)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub async fn global_version(&self) -> u64 {
        let state = self.state.read().await;
        state.global_version
    }

    /// 按名取凭证组快照
    pub async fn group(&self, name: &str) -> Option<CredentialGroup> {
        let state = self.state.read().await;
        state.groups.iter().find(|group| group.name == name).cloned()
    }

    /// 读取单个凭证值
    pub async fn get(&self, group_name: &str, key: &str) -> Option<String> {
        let state = self.state.read().await;
        state
            .groups
            .iter()
            .find(|group| group.name == group_name)
            .and_then(|group| group.get(key))
            .map(str::to_string)
    }

    /// 初始全量加载
    ///
    /// 不带版本界限地列举前缀下的全部键值，把匹配到的值与版本号
    /// 拷入各组条目；没有匹配的条目保持原值。
    pub async fn load_all(&self) -> Result<(), RegistryError> {
        let prefix = self.key_prefix();
        let listing = self.client.list_prefix(&prefix, None).await?;

        let mut state = self.state.write().await;
        for group in &mut state.groups {
            for entry in &mut group.entries {
                // 凭证集合很小且加载频率低，逐对扫描即可
                for pair in &listing.pairs {
                    let Some(bare_key) = pair.key.strip_prefix(&prefix) else {
                        continue;
                    };
                    if bare_key == entry.key {
                        entry.value = pair.value.clone();
                        entry.version = pair.modify_version;
                    }
                }
            }
        }
        state.global_version = listing.last_index;

        tracing::info!(
            service_name = %self.service_name,
            env = %self.env,
            version = listing.last_index,
            "Loaded credential groups from registry"
        );

        Ok(())
    }

    /// 对监听前缀做一次长轮询，以当前全局版本为界
    pub async fn poll(&self) -> Result<KvListing, RegistryError> {
        let wait = self.global_version().await;
        self.client
            .list_prefix(&self.key_prefix(), Some(wait))
            .await
    }

    /// 把一次列举结果并入缓存，返回发生变化的组
    ///
    /// 变化以条目版本号为准：版本不同才写入，值相同与否无关。
    /// 出现脏条目的组会推动全局版本前进，并整组克隆进返回值。
    pub(crate) async fn apply_listing(&self, listing: &KvListing) -> Vec<CredentialGroup> {
        let prefix = self.key_prefix();
        let mut changed = Vec::new();

        let mut state = self.state.write().await;
        for group_index in 0..state.groups.len() {
            let group = &mut state.groups[group_index];
            let mut dirty = false;

            for entry in &mut group.entries {
                for pair in &listing.pairs {
                    let Some(bare_key) = pair.key.strip_prefix(&prefix) else {
                        continue;
                    };
                    if bare_key == entry.key && pair.modify_version != entry.version {
                        entry.value = pair.value.clone();
                        entry.version = pair.modify_version;
                        dirty = true;
                    }
                }
            }

            if dirty {
                let snapshot = group.clone();
                state.global_version = listing.last_index;
                changed.push(snapshot);
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{InMemoryRegistry, KvPair};

    fn make_store() -> CredentialStore {
        let client = Arc::new(InMemoryRegistry::default());
        CredentialStore::new(
            client,
            "svc",
            "dev",
            vec![CredentialGroup::new("db", ["user", "pass"])],
        )
    }

    fn pair(key: &str, value: &str, version: u64) -> KvPair {
        KvPair {
            key: key.to_string(),
            value: value.to_string(),
            create_version: version,
            modify_version: version,
        }
    }

    #[tokio::test]
    async fn test_apply_listing_updates_changed_entry() {
        let store = make_store();

        // 初始状态：user/pass 都在版本 5
        let initial = KvListing {
            pairs: vec![
                pair("svc/dev/user", "alice", 5),
                pair("svc/dev/pass", "secret", 5),
            ],
            last_index: 5,
        };
        let changed = store.apply_listing(&initial).await;
        assert_eq!(changed.len(), 1);
        assert_eq!(store.global_version().await, 5);
        assert_eq!(store.get("db", "user").await.as_deref(), Some("alice"));
        assert_eq!(store.get("db", "pass").await.as_deref(), Some("secret"));

        // pass 在版本 7 被改写，user 保持不动
        let tick = KvListing {
            pairs: vec![
                pair("svc/dev/user", "alice", 5),
                pair("svc/dev/pass", "secret2", 7),
            ],
            last_index: 7,
        };
        let changed = store.apply_listing(&tick).await;
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].name, "db");
        assert_eq!(changed[0].get("pass"), Some("secret2"));
        assert_eq!(changed[0].get("user"), Some("alice"));
        assert_eq!(store.global_version().await, 7);

        let group = store.group("db").await.expect("group should exist");
        let user = &group.entries[0];
        let pass = &group.entries[1];
        assert_eq!(user.version, 5);
        assert_eq!(pass.version, 7);
    }

    #[tokio::test]
    async fn test_apply_listing_is_idempotent() {
        let store = make_store();
        let listing = KvListing {
            pairs: vec![pair("svc/dev/user", "alice", 3)],
            last_index: 3,
        };

        let first = store.apply_listing(&listing).await;
        assert_eq!(first.len(), 1);

        // 同一份列举再并入一次：没有条目变化，也没有事件
        let second = store.apply_listing(&listing).await;
        assert!(second.is_empty());
        assert_eq!(store.global_version().await, 3);
    }

    #[tokio::test]
    async fn test_apply_listing_same_value_new_version_still_applies() {
        let store = make_store();
        store
            .apply_listing(&KvListing {
                pairs: vec![pair("svc/dev/user", "alice", 4)],
                last_index: 4,
            })
            .await;

        // 值没变但版本前进：变化信号以版本为准，必须照常应用
        let changed = store
            .apply_listing(&KvListing {
                pairs: vec![pair("svc/dev/user", "alice", 5)],
                last_index: 5,
            })
            .await;

        assert_eq!(changed.len(), 1);
        let group = store.group("db").await.expect("group should exist");
        assert_eq!(group.entries[0].version, 5);
        assert_eq!(store.global_version().await, 5);
    }

    #[tokio::test]
    async fn test_apply_listing_missing_key_retains_previous_value() {
        let store = make_store();
        store
            .apply_listing(&KvListing {
                pairs: vec![
                    pair("svc/dev/user", "alice", 2),
                    pair("svc/dev/pass", "secret", 2),
                ],
                last_index: 2,
            })
            .await;

        // user 从列举里消失：保持上次的值和版本
        let changed = store
            .apply_listing(&KvListing {
                pairs: vec![pair("svc/dev/pass", "secret3", 6)],
                last_index: 6,
            })
            .await;

        assert_eq!(changed.len(), 1);
        let group = store.group("db").await.expect("group should exist");
        assert_eq!(group.get("user"), Some("alice"));
        assert_eq!(group.entries[0].version, 2);
        assert_eq!(group.get("pass"), Some("secret3"));
    }

    #[tokio::test]
    async fn test_unrelated_key_marks_nothing_dirty() {
        let store = make_store();

        // 前缀下出现无关的键：没有组变脏，全局版本保持原位
        let changed = store
            .apply_listing(&KvListing {
                pairs: vec![pair("svc/dev/other", "x", 9)],
                last_index: 9,
            })
            .await;

        assert!(changed.is_empty());
        assert_eq!(store.global_version().await, 0);
    }
}
