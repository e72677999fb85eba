//! Stream tests against a mock HTTP server using wiremock.

use sse_client::{Client, ClientError, StreamOptions};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = "event: update\r\ndata: {\"x\":1}\r\nid: 42\r\n\r\n: keepalive\r\ndata: second\r\n\r\n";

/// Helper to mount an event-stream endpoint.
async fn setup_stream_server(body: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(header("Accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream"))
        .mount(&mock_server)
        .await;
    mock_server
}

async fn drain(client: &mut Client) -> Vec<sse_client::Event> {
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(5), client.recv()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => return events,
            Err(_) => panic!("stream did not end in time"),
        }
    }
}

#[tokio::test]
async fn test_open_decodes_events() {
    let mock_server = setup_stream_server(BODY).await;

    let mut client = Client::open(&format!("{}/events", mock_server.uri()))
        .await
        .expect("open failed");
    let events = drain(&mut client).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), "update");
    assert_eq!(events[0].id, "42");
    assert_eq!(events[0].data, "{\"x\":1}\n");
    assert_eq!(events[1].kind(), "message");
    assert_eq!(events[1].id, "");
    assert_eq!(events[1].data, "second\n");
    assert!(client.err().is_none(), "unexpected error: {:?}", client.err());
}

#[tokio::test]
async fn test_open_sends_extra_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(header("X-Token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("data: ok\n\n", "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = StreamOptions::new()
        .with_capacity(4)
        .with_header("X-Token".to_string(), "abc".to_string());
    let mut client = Client::open_with_options(&format!("{}/events", mock_server.uri()), &options)
        .await
        .expect("open failed");

    let events = drain(&mut client).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text().unwrap(), "ok\n");
}

#[tokio::test]
async fn test_open_rejects_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let result = Client::open(&format!("{}/events", mock_server.uri())).await;

    match result {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_open_rejects_invalid_url() {
    let result = Client::open("not a url").await;
    assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_open_fails_when_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/events", listener.local_addr().unwrap());
    drop(listener);

    let result = Client::open(&url).await;
    assert!(matches!(result, Err(ClientError::Http(_))));
}

/// Helper to start a server that sends one event and then stalls with the
/// connection held open.
async fn setup_stalling_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;

        let response = "HTTP/1.1 200 OK\r\n\
                        Content-Type: text/event-stream\r\n\
                        Transfer-Encoding: chunked\r\n\r\n\
                        b\r\ndata: one\n\n\r\n";
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        std::future::pending::<()>().await;
        drop(socket);
    });

    format!("http://{}/events", addr)
}

#[tokio::test]
async fn test_close_aborts_blocked_read() {
    let url = setup_stalling_server().await;

    let mut client = Client::open(&url).await.expect("open failed");
    let first = tokio::time::timeout(Duration::from_secs(5), client.recv())
        .await
        .expect("first event did not arrive")
        .expect("stream ended early");
    assert_eq!(first.data, "one\n");
    assert!(!client.is_finished());

    client.close();
    client.close();

    let rest = drain(&mut client).await;
    assert!(rest.is_empty());
    assert!(matches!(client.err(), Some(ClientError::StreamCancelled)));
}
