use super::test_helpers::{PeerEvent, spawn_echo_peer, unused_url};
use super::*;
use tokio::time::{Duration, timeout};

async fn next_socket_event(rx: &mut mpsc::Receiver<RelayEvent>) -> (Feed, Uuid, SocketEvent) {
    let event = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("socket event timed out")
        .expect("relay channel closed");
    match event {
        RelayEvent::Socket { feed, id, event } => (feed, id, event),
        other => panic!("unexpected relay event: {other:?}"),
    }
}

async fn next_peer_event(peer: &mut test_helpers::TestPeer) -> PeerEvent {
    timeout(Duration::from_secs(5), peer.observed.recv())
        .await
        .expect("peer event timed out")
        .expect("peer channel closed")
}

#[tokio::test]
async fn state_machine_follows_lifecycle() {
    let (tx, _rx) = mpsc::channel(8);
    let url = unused_url().await;
    let mut conn = Connection::open(Feed::Chat, url, tx);

    assert_eq!(conn.state(), ConnectionState::Connecting);
    assert_eq!(conn.apply(&SocketEvent::Frame("x".into())), None);
    assert_eq!(conn.apply(&SocketEvent::Opened), Some(ConnectionState::Open));
    assert_eq!(conn.apply(&SocketEvent::Opened), None);
    assert_eq!(conn.apply(&SocketEvent::Closed), Some(ConnectionState::Closed));
    assert_eq!(conn.apply(&SocketEvent::Errored("late".into())), None);
    assert_eq!(conn.apply(&SocketEvent::Opened), None);
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn errored_connection_ignores_later_close() {
    let (tx, _rx) = mpsc::channel(8);
    let mut conn = Connection::open(Feed::Game, unused_url().await, tx);

    assert_eq!(
        conn.apply(&SocketEvent::Errored("refused".into())),
        Some(ConnectionState::Errored)
    );
    assert_eq!(conn.apply(&SocketEvent::Closed), None);
    assert_eq!(conn.state(), ConnectionState::Errored);
}

#[tokio::test]
async fn send_before_open_is_rejected() {
    let (tx, _rx) = mpsc::channel(8);
    let conn = Connection::open(Feed::Chat, unused_url().await, tx);

    let err = conn.send("hello".into()).expect_err("still connecting");
    assert!(matches!(
        err,
        RelayError::NotOpen {
            feed: Feed::Chat,
            state: ConnectionState::Connecting
        }
    ));
}

#[tokio::test]
async fn refused_connection_reports_error() {
    let (tx, mut rx) = mpsc::channel(8);
    let conn = Connection::open(Feed::Chat, unused_url().await, tx);

    let (feed, id, event) = next_socket_event(&mut rx).await;
    assert_eq!(feed, Feed::Chat);
    assert_eq!(id, conn.id());
    assert!(matches!(event, SocketEvent::Errored(_)));
}

#[tokio::test]
async fn open_connection_relays_frames_both_ways() {
    let mut peer = spawn_echo_peer().await;
    let (tx, mut rx) = mpsc::channel(8);
    let mut conn = Connection::open(Feed::Game, peer.url(), tx);

    let (_, _, event) = next_socket_event(&mut rx).await;
    assert_eq!(event, SocketEvent::Opened);
    conn.apply(&event);
    assert_eq!(next_peer_event(&mut peer).await, PeerEvent::Accepted);

    conn.send(r#"{"action":"stop"}"#.into()).expect("open connection sends");
    assert_eq!(
        next_peer_event(&mut peer).await,
        PeerEvent::Received(r#"{"action":"stop"}"#.into())
    );

    let (feed, id, event) = next_socket_event(&mut rx).await;
    assert_eq!(feed, Feed::Game);
    assert_eq!(id, conn.id());
    assert_eq!(event, SocketEvent::Frame(r#"{"action":"stop"}"#.into()));
}

#[tokio::test]
async fn close_disconnects_from_peer() {
    let mut peer = spawn_echo_peer().await;
    let (tx, mut rx) = mpsc::channel(8);
    let mut conn = Connection::open(Feed::Chat, peer.url(), tx);

    let (_, _, event) = next_socket_event(&mut rx).await;
    conn.apply(&event);
    assert_eq!(next_peer_event(&mut peer).await, PeerEvent::Accepted);

    let task = conn.close();
    timeout(Duration::from_secs(5), task)
        .await
        .expect("close timed out")
        .expect("socket task should not panic");
    assert_eq!(next_peer_event(&mut peer).await, PeerEvent::Disconnected);
}

#[tokio::test]
async fn peer_close_is_answered_before_reporting_closed() {
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}/", listener.local_addr().expect("local addr"));
    let peer = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        ws.send(Message::Close(None)).await.expect("send close");
        timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("close reply timed out")
    });

    let (tx, mut rx) = mpsc::channel(8);
    let _conn = Connection::open(Feed::Game, url, tx);

    assert_eq!(next_socket_event(&mut rx).await.2, SocketEvent::Opened);
    assert_eq!(next_socket_event(&mut rx).await.2, SocketEvent::Closed);

    let reply = peer.await.expect("peer task");
    assert!(
        matches!(reply, Some(Ok(Message::Close(_))) | None),
        "expected the close handshake to complete, got {reply:?}"
    );
}
