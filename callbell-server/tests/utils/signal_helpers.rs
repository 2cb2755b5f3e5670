use anyhow::{Result, bail};
use callbell_core::{CallRequest, UserId};
use callbell_server::{HubStats, SignalingService};
use std::time::Duration;

use crate::utils::{TestClient, TestServer};

pub fn call_request(call_id: &str, caller: &str, callee: &str) -> CallRequest {
    CallRequest {
        call_id: call_id.into(),
        caller_id: UserId::from(caller),
        callee_id: UserId::from(callee),
    }
}

/// Polls hub statistics until `check` holds or the timeout elapses.
pub async fn wait_for_stats(
    service: &SignalingService,
    timeout_ms: u64,
    check: impl Fn(&HubStats) -> bool,
) -> Result<HubStats> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let stats = service.stats().await?;
        if check(&stats) {
            return Ok(stats);
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("hub stats never matched, last seen {:?}", stats);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connects and announces every `(label, user)` pair, waiting until the hub has them all.
pub async fn connect_announced(server: &TestServer, peers: &[(&str, &str)]) -> Result<Vec<TestClient>> {
    let service = server.service();
    let before = service.stats().await?.announced;

    let mut clients = Vec::with_capacity(peers.len());
    for (label, user) in peers {
        let mut client = TestClient::connect(&server.ws_url(), label).await?;
        client.announce(user).await?;
        clients.push(client);
    }

    let expected = before + peers.len();
    wait_for_stats(&service, 2000, |stats| stats.announced >= expected).await?;
    Ok(clients)
}
