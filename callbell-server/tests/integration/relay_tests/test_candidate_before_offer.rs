use callbell_core::{ClientEvent, ServerEvent};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{TestServer, connect_announced};

#[tokio::test]
async fn test_candidate_before_offer() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");
    let mut clients = connect_announced(&server, &[("A", "alice"), ("B", "bob")])
        .await
        .expect("Failed to announce");

    let candidate = json!({"to": "alice", "candidate": {"candidate": "candidate:1 1 udp 1 10.0.0.1 5000 typ host"}});
    let offer = json!({"to": "alice", "sdp": {"type": "offer", "sdp": "v=0"}});
    clients[1]
        .send(ClientEvent::Candidate(candidate.clone()))
        .await
        .unwrap();
    clients[1].send(ClientEvent::Offer(offer.clone())).await.unwrap();

    assert_eq!(clients[0].recv().await.unwrap(), ServerEvent::Candidate(candidate));
    assert_eq!(clients[0].recv().await.unwrap(), ServerEvent::Offer(offer));

    let answer = json!({"to": "bob", "sdp": {"type": "answer", "sdp": "v=0"}});
    clients[0].send(ClientEvent::Answer(answer.clone())).await.unwrap();
    assert_eq!(clients[1].recv().await.unwrap(), ServerEvent::Answer(answer));
}
