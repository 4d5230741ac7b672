//! Tests of the HTTP transport against a minimal HTTP server on a local socket.
#![cfg(feature = "http")]

#[path = "../src/testing.rs"]
mod test_helpers;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use assert_matches::assert_matches;
use jsonrpc_client::{CallOptions, Client, ErrorKind, JsonRpcError};
use serde_json::json;
use test_helpers::ScriptedIds;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The parts of an HTTP request the tests look at.
#[derive(Debug)]
struct ReceivedRequest {
    request_line: String,
    /// Header names are lowercased
    headers: HashMap<String, String>,
    body: String,
}

/// Canned reply the server sends back.
struct CannedReply {
    status: &'static str,
    body: String,
}

impl CannedReply {
    fn ok(body: serde_json::Value) -> Self {
        Self {
            status: "200 OK",
            body: body.to_string(),
        }
    }
}

/// Accept a single connection, read one request from it, and answer with `reply`.
///
/// If `reply` is `None` the connection is held open without answering until the client gives up.
async fn serve_once(reply: Option<CannedReply>) -> (SocketAddr, JoinHandle<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let length: usize = headers
            .get("content-length")
            .map(|length| length.parse().unwrap())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).await.unwrap();

        let received = ReceivedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(body).unwrap(),
        };

        match reply {
            Some(reply) => {
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reply.body.len(),
                    reply.body
                );
                writer.write_all(response.as_bytes()).await.unwrap();
                writer.shutdown().await.unwrap();
            }
            None => {
                // Wait for the client to hang up
                let mut rest = Vec::new();
                let _ = reader.read_to_end(&mut rest).await;
            }
        }

        received
    });

    (addr, handle)
}

fn client_for(addr: SocketAddr) -> jsonrpc_client::ClientBuilder {
    Client::builder(format!("http://{addr}/rpc")).with_id_generator(ScriptedIds::new([1u64]))
}

#[tokio::test]
async fn posts_request_with_headers() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(Some(CannedReply::ok(json!({"jsonrpc": "2.0", "result": 7, "id": 1})))).await;
    let client = client_for(addr).with_header("X-Api-Key", "secret").build().unwrap();

    let result = client.invoke("sum", vec![json!(1), json!(2), json!(4)]).await.unwrap();
    assert_eq!(result, json!(7));

    let received = server.await.unwrap();
    assert_eq!(received.request_line, "POST /rpc HTTP/1.1");
    assert_eq!(received.headers.get("content-type").map(String::as_str), Some("application/json"));
    assert_eq!(received.headers.get("x-api-key").map(String::as_str), Some("secret"));
    assert_eq!(
        received.body,
        r#"{"jsonrpc":"2.0","method":"sum","params":[1,2,4],"id":1}"#
    );
}

#[tokio::test]
async fn per_call_headers_and_custom_content_type() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(Some(CannedReply::ok(json!({"jsonrpc": "2.0", "result": null, "id": 1})))).await;
    let client = client_for(addr)
        .with_content_type("application/json-rpc")
        .with_header("X-Trace", "client")
        .build()
        .unwrap();

    let options = CallOptions::new().with_header("X-Trace", "call");
    let result = client.invoke_with("ping", vec![], &options).await.unwrap();
    assert_eq!(result, json!(null));

    let received = server.await.unwrap();
    assert_eq!(
        received.headers.get("content-type").map(String::as_str),
        Some("application/json-rpc")
    );
    assert_eq!(received.headers.get("x-trace").map(String::as_str), Some("call"));
}

#[tokio::test]
async fn error_status_body_is_still_interpreted() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(Some(CannedReply {
        status: "500 Internal Server Error",
        body: json!({"jsonrpc": "2.0", "error": {"code": -32603, "message": "Internal error"}, "id": 1}).to_string(),
    }))
    .await;
    let client = client_for(addr).build().unwrap();

    let err = client.invoke("explode", vec![]).await.unwrap_err();
    assert_matches!(err, JsonRpcError::ServerError { code: -32603, message, .. } if message == "Internal error");
    server.await.unwrap();
}

#[tokio::test]
async fn empty_http_body_is_an_invalid_response() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(Some(CannedReply {
        status: "200 OK",
        body: String::new(),
    }))
    .await;
    let client = client_for(addr).build().unwrap();

    let err = client.invoke("sum", vec![json!(1)]).await.unwrap_err();
    assert_matches!(err, JsonRpcError::InvalidResponse { .. });
    server.await.unwrap();
}

#[tokio::test]
async fn batch_over_http() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(Some(CannedReply::ok(json!([
        {"jsonrpc": "2.0", "result": 19, "id": "b"},
        {"jsonrpc": "2.0", "result": 7, "id": "a"},
    ]))))
    .await;
    let client = Client::builder(format!("http://{addr}/rpc"))
        .with_id_generator(ScriptedIds::new(["a", "b"]))
        .build()
        .unwrap();

    let mut batch = client.start_batch();
    let sum = batch.call("sum", vec![json!(3), json!(4)]).unwrap();
    let subtract = batch.call("subtract", vec![json!(42), json!(23)]).unwrap();
    batch.send().await.unwrap();

    assert_eq!(sum.result(), Some(&json!(7)));
    assert_eq!(subtract.result(), Some(&json!(19)));

    let received = server.await.unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&received.body).unwrap(),
        json!([
            {"jsonrpc": "2.0", "method": "sum", "params": [3, 4], "id": "a"},
            {"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": "b"},
        ])
    );
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    test_helpers::init_test_logging();

    let (addr, server) = serve_once(None).await;
    let client = client_for(addr)
        .with_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.invoke("sleep", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);

    // The request still made it to the server before the client gave up
    let received = server.await.unwrap();
    assert_eq!(received.body, r#"{"jsonrpc":"2.0","method":"sleep","id":1}"#);
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    test_helpers::init_test_logging();

    // Bind and immediately drop a listener to get a port nothing listens on
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let client = client_for(addr).build().unwrap();

    let err = client.invoke("sum", vec![json!(1)]).await.unwrap_err();
    assert_matches!(err, JsonRpcError::Transport { .. });
}
