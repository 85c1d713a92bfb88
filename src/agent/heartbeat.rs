use std::sync::Arc;

use futures::future::BoxFuture;

use crate::client::{HealthStatus, check_id};

use super::RegistryAgent;

/// 应用健康检查回调，返回本实例当前是否健康
pub type HealthCheck = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

impl RegistryAgent {
    // 心跳任务启动
    pub fn spawn_heartbeat(&self, check: HealthCheck) {
        let client = self.client.clone();
        let cancel = self.cancel.child_token();
        let check_id = check_id(&self.config.service_name);
        let service_name = self.config.service_name.clone();
        let pass_phrase = self.config.pass_phrase.clone();
        let fail_phrase = self.config.fail_phrase.clone();
        // TTL 的一半作为上报周期，留出网络抖动的余量
        let period = self.config.ttl() / 2;

        self.tasks.spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let healthy = check().await;
                let (status, note) = if healthy {
                    (HealthStatus::Pass, pass_phrase.as_str())
                } else {
                    (HealthStatus::Fail, fail_phrase.as_str())
                };

                if let Err(error) = client.update_ttl(&check_id, note, status).await {
                    // 上报失败不终止循环，下个周期重试
                    tracing::warn!(
                        service_name = %service_name,
                        error = %error,
                        "Failed to report heartbeat"
                    );
                } else if !healthy {
                    tracing::warn!(
                        service_name = %service_name,
                        "Reported failing health check"
                    );
                }
            }

            tracing::debug!(service_name = %service_name, "Heartbeat loop cancelled");
        });
    }
}
