use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::client::RegistryError;

use super::store::{CredentialGroup, CredentialStore};

/// 凭证监听循环
///
/// 按固定周期对注册中心做长轮询，把发生变化的凭证组发布到更新通道。
/// 长轮询本身会阻塞到前缀版本前进或注册中心侧最大等待到期，
/// 循环不会因此被视为停滞。
pub struct CredentialWatcher {
    store: Arc<CredentialStore>,
    period: Duration,
    cancel: CancellationToken,
}

impl CredentialWatcher {
    pub fn new(store: Arc<CredentialStore>, period: Duration) -> Self {
        Self::with_cancellation(store, period, CancellationToken::new())
    }

    /// 用外部取消令牌构造，便于与其他后台任务统一停机
    pub fn with_cancellation(
        store: Arc<CredentialStore>,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            period,
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行监听循环直到被取消或更新通道关闭
    ///
    /// 注册中心调用失败不会终止循环：错误推入 `error_tx` 后等待下一个周期重试。
    pub async fn run(
        self,
        update_tx: mpsc::Sender<CredentialGroup>,
        error_tx: mpsc::Sender<RegistryError>,
    ) {
        let mut interval = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            // 长轮询与取消信号赛跑，保证停机有界
            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.store.poll() => result,
            };

            let listing = match result {
                Ok(listing) => listing,
                Err(error) => {
                    tracing::warn!(
                        service_name = %self.store.service_name(),
                        error = %error,
                        "Credential poll failed, retrying next tick"
                    );
                    let _ = error_tx.send(error).await;
                    continue;
                }
            };

            // 版本没有前进说明是长轮询窗口内的空转返回
            if listing.last_index <= self.store.global_version().await {
                continue;
            }

            let changed = self.store.apply_listing(&listing).await;
            for group in changed {
                tracing::info!(
                    service_name = %self.store.service_name(),
                    group = %group.name,
                    version = listing.last_index,
                    "Credential group changed"
                );

                if update_tx.send(group).await.is_err() {
                    // 消费端已关闭，监听随之结束
                    tracing::debug!("Credential update channel closed, stopping watcher");
                    return;
                }
            }
        }

        tracing::debug!(
            service_name = %self.store.service_name(),
            "Credential watcher cancelled"
        );
    }
}

/// 把更新接收端包装成流，便于用组合子消费
pub fn update_stream(rx: mpsc::Receiver<CredentialGroup>) -> ReceiverStream<CredentialGroup> {
    ReceiverStream::new(rx)
}
