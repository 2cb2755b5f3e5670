use callbell_core::{CallCancelled, CallEndReason, CallRejected, ClientEvent, ServerEvent};
use callbell_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::{TestServer, call_request, connect_announced};

#[tokio::test]
async fn test_call_expires_unanswered() {
    init_tracing();

    let config = ServerConfig {
        call_timeout_secs: 1,
        sweep_interval_ms: 50,
        ..ServerConfig::default()
    };
    let server = TestServer::start_with(config)
        .await
        .expect("Failed to start server");
    let mut clients = connect_announced(&server, &[("A", "alice"), ("B", "bob")])
        .await
        .expect("Failed to announce");

    clients[1]
        .send(ClientEvent::CallRequest(call_request("x", "bob", "alice")))
        .await
        .unwrap();
    clients[0].recv().await.expect("Callee was not rung");

    assert_eq!(
        clients[1].recv_within(3000).await.unwrap(),
        ServerEvent::CallRejected(CallRejected {
            call_id: "x".into(),
            reason: Some(CallEndReason::Timeout),
        })
    );
    assert_eq!(
        clients[0].recv_within(1000).await.unwrap(),
        ServerEvent::CallCancelled(CallCancelled {
            call_id: "x".into(),
            reason: Some(CallEndReason::Timeout),
        })
    );

    // Expired exactly once, and a late accept is ignored.
    clients[0]
        .send(ClientEvent::CallAccept(call_request("x", "bob", "alice")))
        .await
        .unwrap();
    clients[1].expect_silence(500).await.unwrap();
}
