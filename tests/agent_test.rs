use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use registry_agent::agent::{AgentError, HealthCheck, RegistryAgent};
use registry_agent::client::{HealthStatus, InMemoryRegistry};
use registry_agent::config::{AgentConfig, ConfigError};
use registry_agent::credentials::{CredentialGroup, CredentialStore};

fn make_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.service_name = "orders".to_string();
    config.address = "10.0.0.12".to_string();
    config.registry_address = "localhost".to_string();
    config.ttl_seconds = 1;
    config.validate().expect("config should validate");
    config
}

// 轮询断言辅助：在限期内等待条件成立
async fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Condition not met within deadline");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_agent_registers_service() {
    let registry = Arc::new(InMemoryRegistry::default());
    let agent = RegistryAgent::new(make_config(), registry.clone())
        .await
        .expect("agent should start");

    assert!(registry.is_registered("orders"));
    assert_eq!(agent.config().service_name, "orders");
}

#[tokio::test]
async fn test_agent_rejects_unvalidated_config() {
    let registry = Arc::new(InMemoryRegistry::default());
    let mut config = AgentConfig::default();
    config.service_name = "orders".to_string();
    config.address = "10.0.0.12".to_string();
    config.registry_address = "localhost".to_string();

    // 未经 validate 的配置直接拒绝
    let result = RegistryAgent::new(config, registry).await;
    assert!(matches!(
        result,
        Err(AgentError::Config(ConfigError::NotValidated))
    ));
}

#[tokio::test]
async fn test_heartbeat_reports_pass_then_fail() {
    let registry = Arc::new(InMemoryRegistry::default());
    let agent = RegistryAgent::new(make_config(), registry.clone())
        .await
        .expect("agent should start");

    let healthy = Arc::new(AtomicBool::new(true));
    let flag = healthy.clone();
    let check: HealthCheck = Arc::new(move || {
        let flag = flag.clone();
        Box::pin(async move { flag.load(Ordering::SeqCst) })
    });

    agent.spawn_heartbeat(check);

    // 健康时上报 pass 与配置的说明文本
    wait_for(|| {
        matches!(
            registry.last_status("orders"),
            Some((HealthStatus::Pass, _))
        )
    })
    .await;
    let (_, note) = registry.last_status("orders").expect("status should exist");
    assert_eq!(note, "Service alive and reachable.");

    // 检查失败后只上报 fail，不再跟随 pass
    healthy.store(false, Ordering::SeqCst);
    wait_for(|| {
        matches!(
            registry.last_status("orders"),
            Some((HealthStatus::Fail, _))
        )
    })
    .await;
    let (_, note) = registry.last_status("orders").expect("status should exist");
    assert_eq!(note, "Service unreachable.");

    agent.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_loops_and_deregisters() {
    let registry = Arc::new(InMemoryRegistry::new(Duration::from_secs(30)));
    registry.put("orders/dev/user", "alice").await;

    let agent = RegistryAgent::new(make_config(), registry.clone())
        .await
        .expect("agent should start");

    let store = Arc::new(CredentialStore::new(
        registry.clone(),
        "orders",
        "dev",
        vec![CredentialGroup::new("db", ["user", "pass"])],
    ));
    store.load_all().await.expect("load_all should succeed");

    let (update_tx, mut update_rx) = mpsc::channel(16);
    let (error_tx, _error_rx) = mpsc::channel(16);
    agent.spawn_credential_watch(store.clone(), Duration::from_millis(10), update_tx, error_tx);

    // 监听循环在代理托管下正常工作
    registry.put("orders/dev/pass", "secret").await;
    let group = timeout(Duration::from_secs(2), update_rx.recv())
        .await
        .expect("Timeout waiting for credential update")
        .expect("Update channel closed unexpectedly");
    assert_eq!(group.name, "db");

    // 即使长轮询仍在阻塞，停机也必须在有界时间内完成
    timeout(Duration::from_secs(2), agent.shutdown())
        .await
        .expect("Shutdown did not finish in time");

    assert!(!registry.is_registered("orders"));
}
