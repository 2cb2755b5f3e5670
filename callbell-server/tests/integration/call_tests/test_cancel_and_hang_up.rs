use callbell_core::{CallCancelled, CallEnded, CallRef, ClientEvent, ServerEvent};

use crate::integration::init_tracing;
use crate::utils::{TestServer, call_request, connect_announced, wait_for_stats};

#[tokio::test]
async fn test_cancel_and_hang_up() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = connect_announced(&server, &[("A", "alice"), ("B", "bob")])
        .await
        .expect("Failed to announce");

    // Bob gives up before alice answers.
    clients[1]
        .send(ClientEvent::CallRequest(call_request("first", "bob", "alice")))
        .await
        .unwrap();
    clients[0].recv().await.unwrap();
    clients[1]
        .send(ClientEvent::CallCancel(CallRef {
            call_id: "first".into(),
        }))
        .await
        .unwrap();
    assert_eq!(
        clients[0].recv().await.unwrap(),
        ServerEvent::CallCancelled(CallCancelled {
            call_id: "first".into(),
            reason: None,
        })
    );

    // Second attempt is answered, then alice hangs up.
    clients[1]
        .send(ClientEvent::CallRequest(call_request("second", "bob", "alice")))
        .await
        .unwrap();
    clients[0].recv().await.unwrap();
    clients[0]
        .send(ClientEvent::CallAccept(call_request("second", "bob", "alice")))
        .await
        .unwrap();
    clients[1].recv().await.unwrap();

    clients[0]
        .send(ClientEvent::CallEnd(CallRef {
            call_id: "second".into(),
        }))
        .await
        .unwrap();
    assert_eq!(
        clients[1].recv().await.unwrap(),
        ServerEvent::CallEnded(CallEnded {
            call_id: "second".into(),
            ended_by: Some("alice".into()),
            reason: None,
        })
    );
    clients[0].expect_silence(200).await.unwrap();

    let stats = wait_for_stats(&server.service(), 1000, |s| s.live_calls == 0)
        .await
        .unwrap();
    assert_eq!(stats.tracked_calls, 2);
}
