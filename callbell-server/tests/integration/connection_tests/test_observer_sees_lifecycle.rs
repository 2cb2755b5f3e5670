use callbell_core::{CallAccepted, CallState, ClientEvent, ServerEvent, UserId};
use callbell_server::ServerConfig;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{
    ObserverEvent, RecordingObserver, TestServer, call_request, connect_announced, wait_for_stats,
};

#[tokio::test]
async fn test_observer_sees_lifecycle() {
    init_tracing();

    let observer = RecordingObserver::new();
    let server = TestServer::start_with_observer(ServerConfig::default(), Arc::new(observer.clone()))
        .await
        .expect("Failed to start server");

    let mut clients = connect_announced(&server, &[("A", "alice"), ("B", "bob")])
        .await
        .expect("Failed to announce");
    let mut bob = clients.pop().unwrap();
    let mut alice = clients.pop().unwrap();

    bob.send(ClientEvent::CallRequest(call_request("c1", "bob", "alice")))
        .await
        .expect("Failed to request");
    assert_eq!(
        alice.recv().await.unwrap(),
        ServerEvent::CallIncoming(call_request("c1", "bob", "alice"))
    );

    alice
        .send(ClientEvent::CallAccept(call_request("c1", "bob", "alice")))
        .await
        .expect("Failed to accept");
    assert_eq!(
        bob.recv().await.unwrap(),
        ServerEvent::CallAccepted(CallAccepted {
            call_id: "c1".into(),
            callee_id: "alice".into(),
        })
    );

    alice.close().await.expect("Failed to close alice");
    wait_for_stats(&server.service(), 2000, |s| s.connections == 1)
        .await
        .expect("Hub never saw the disconnect");

    assert!(
        observer.wait_for_events(5, 2000).await,
        "Observer saw {:?}",
        observer.get_events().await
    );
    let events = observer.get_events().await;
    assert_eq!(events.len(), 5, "Unexpected callbacks: {events:?}");

    let mut announced: Vec<_> = events[..2]
        .iter()
        .map(|event| match event {
            ObserverEvent::Announce { user, .. } => user.clone(),
            other => panic!("expected announce, got {other:?}"),
        })
        .collect();
    announced.sort();
    assert_eq!(announced, vec![UserId::from("alice"), UserId::from("bob")]);

    let alice_connection = events[..2]
        .iter()
        .find_map(|event| match event {
            ObserverEvent::Announce { connection_id, user } if user.as_str() == "alice" => {
                Some(*connection_id)
            }
            _ => None,
        })
        .expect("alice was announced");

    assert_eq!(
        events[2],
        ObserverEvent::Call {
            call_id: "c1".into(),
            state: CallState::Requested,
        }
    );
    assert_eq!(
        events[3],
        ObserverEvent::Call {
            call_id: "c1".into(),
            state: CallState::Accepted,
        }
    );
    assert_eq!(
        events[4],
        ObserverEvent::Leave {
            connection_id: alice_connection,
            user: Some("alice".into()),
        }
    );
}
