use callbell_core::{CallAccepted, ClientEvent, ServerEvent};

use crate::integration::init_tracing;
use crate::utils::{TestServer, call_request, connect_announced};

#[tokio::test]
async fn test_accept_reaches_only_caller() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = connect_announced(&server, &[("A1", "alice"), ("A2", "alice"), ("B", "bob")])
        .await
        .expect("Failed to announce");

    clients[2]
        .send(ClientEvent::CallRequest(call_request("x", "bob", "alice")))
        .await
        .unwrap();

    let incoming = ServerEvent::CallIncoming(call_request("x", "bob", "alice"));
    assert_eq!(clients[0].recv().await.unwrap(), incoming);
    assert_eq!(clients[1].recv().await.unwrap(), incoming);
    clients[2]
        .expect_silence(200)
        .await
        .expect("Caller must not be rung");

    clients[0]
        .send(ClientEvent::CallAccept(call_request("x", "bob", "alice")))
        .await
        .unwrap();

    assert_eq!(
        clients[2].recv().await.unwrap(),
        ServerEvent::CallAccepted(CallAccepted {
            call_id: "x".into(),
            callee_id: "alice".into(),
        })
    );
    clients[2].expect_silence(200).await.expect("Accepted twice");
    clients[1]
        .expect_silence(200)
        .await
        .expect("Other tab must not hear the accept");
}
