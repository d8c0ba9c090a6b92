//! NewSystemClient against a one-shot local HTTP server

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use yematch_harness::config::NewSystemConfig;
use yematch_harness::{ClientError, NewSystemApi, NewSystemClient};

/// Serve one request with `status` and `body`; the join handle yields the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            if n == 0 || request_complete(&raw) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    });
    (base, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(end) = text.find("\r\n\r\n") else {
        return false;
    };
    let length = text[..end]
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= end + 4 + length
}

fn client(base: String) -> NewSystemClient {
    NewSystemClient::new(&NewSystemConfig {
        base_url: base,
        token: Some("secret-token".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn get_sends_bearer_token_and_query() {
    let (base, server) = serve_once("200 OK", r#"{"response":{"results":[{"badgeNumber":1}]}}"#).await;
    let value = client(base)
        .get_json(
            "api/yearend/duplicate-ssns",
            vec![("profitYear".to_string(), "2024".to_string())],
        )
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/yearend/duplicate-ssns?profitYear=2024 HTTP/1.1"), "{request}");
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-token"));
    assert_eq!(value["response"]["results"][0]["badgeNumber"], 1);
}

#[tokio::test]
async fn post_sends_json_body() {
    let (base, server) = serve_once("200 OK", "").await;
    let value = client(base)
        .post_json("/api/yearend/final", json!({ "profitYear": 2024 }))
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/yearend/final HTTP/1.1"), "{request}");
    assert!(request.ends_with(r#"{"profitYear":2024}"#), "{request}");
    assert!(value.is_null());
}

#[tokio::test]
async fn error_status_keeps_the_body() {
    let (base, server) = serve_once("500 Internal Server Error", r#"{"title":"boom"}"#).await;
    let err = client(base)
        .get_text("api/yearend/breakdown-by-store", Vec::new())
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        ClientError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("unexpected {other}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let (base, server) = serve_once("200 OK", "not json").await;
    let err = client(base).get_json("api/yearend/x", Vec::new()).await.unwrap_err();
    server.await.unwrap();
    assert!(matches!(err, ClientError::Decode { .. }));
}
