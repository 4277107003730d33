//! Load testing for the forward proxy.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use forward_proxy::cache::ResponseCache;
use forward_proxy::config::ProxyConfig;

mod common;

#[tokio::test]
async fn test_admission_gate_cycles_under_load() {
    // Origin slower than the gate is wide: clients must queue on the gate
    // and every permit must come back for the run to finish.
    let (origin, hits) = common::start_programmable_origin(|_| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        (200, "slow".to_string())
    })
    .await;

    let mut config = ProxyConfig::default();
    config.listener.max_clients = 4;

    let cache = Arc::new(ResponseCache::from_config(&config.cache));
    let proxy = common::start_proxy(cache.clone(), config).await;

    let mut tasks = Vec::new();
    for i in 0..16u32 {
        let request = format!("GET /item/{} HTTP/1.1\r\nHost: {}\r\n\r\n", i, origin);
        tasks.push(tokio::spawn(async move {
            common::send_raw(proxy, request.as_bytes()).await
        }));
    }

    for task in tasks {
        let response = task.await.unwrap();
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("slow"));
    }

    // Every distinct request went upstream exactly once and was stored.
    assert_eq!(hits.load(Ordering::SeqCst), 16);
    assert_eq!(cache.len(), 16);
}

#[tokio::test]
async fn test_identical_requests_converge_on_the_cache() {
    let (origin, hits) = common::start_mock_origin("steady").await;

    let cache = Arc::new(ResponseCache::from_config(&ProxyConfig::default().cache));
    let proxy = common::start_proxy(cache.clone(), ProxyConfig::default()).await;

    let request = format!("GET /popular HTTP/1.1\r\nHost: {}\r\n\r\n", origin);

    let mut replies = Vec::new();
    for _ in 0..20 {
        replies.push(common::send_raw(proxy, request.as_bytes()).await);
    }

    assert!(replies.iter().all(|r| r == &replies[0]));
    assert_eq!(
        hits.load(Ordering::SeqCst),
        1,
        "one upstream fetch serves every later request"
    );
    assert_eq!(cache.len(), 1);
}
