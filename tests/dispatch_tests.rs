//! Integration tests driving the reqwest transport against a local server.

use ezapi_client::{EzApiClient, EzApiError, TransportError, Values};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{body_bytes, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One parsed multipart part.
#[derive(Debug, PartialEq)]
struct Part {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    content: Vec<u8>,
}

/// Parses a received `multipart/form-data` body with `multer`.
async fn parse_multipart(body: Vec<u8>, content_type: &str) -> Vec<Part> {
    let boundary = multer::parse_boundary(content_type).unwrap();
    let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let content = field.bytes().await.unwrap().to_vec();
        parts.push(Part {
            name,
            file_name,
            content_type,
            content,
        });
    }
    parts
}

#[tokio::test]
async fn test_json_post_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("content-type", "application/json"))
        .and(body_bytes(br#"{"x":1}"#.to_vec()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Test", "ok")
                .set_body_string("pong"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    let response = client
        .request()
        .url(format!("{}/echo", server.uri()))
        .json(r#"{"x":1}"#)
        .send("POST")
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("x-test"), Some("ok"));
    assert_eq!(response.text(), "pong");
}

#[tokio::test]
async fn test_get_with_query_has_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .and(query_param("q", "a b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    client
        .request()
        .url(format!("{}/items", server.uri()))
        .query(&Values::new().with("q", "a b").with("page", "2"))
        .json(r#"{"ignored":true}"#)
        .send("GET")
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_url_encoded_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("tag=a&tag=b&user=ann+lee"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    let response = client
        .request()
        .url(server.uri())
        .form(&Values::new().with("user", "ann lee").with("tag", "a").with("tag", "b"))
        .send("POST")
        .await
        .unwrap();

    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn test_multipart_fields_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    client
        .request()
        .url(server.uri())
        .form_data(&Values::new().with("a", "1").with("b", "2").with("b", "3"))
        .send("POST")
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let parts = parse_multipart(received[0].body.clone(), content_type).await;

    let fields: Vec<(Option<&str>, &[u8])> = parts
        .iter()
        .map(|p| (p.name.as_deref(), p.content.as_slice()))
        .collect();
    assert_eq!(
        fields,
        vec![
            (Some("a"), &b"1"[..]),
            (Some("b"), &b"2"[..]),
            (Some("b"), &b"3"[..]),
        ]
    );
    assert!(parts.iter().all(|p| p.file_name.is_none()));
}

#[tokio::test]
async fn test_multipart_upload_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"hello").unwrap();
    let file_path = file.path().to_str().unwrap().to_string();

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    let response = client
        .request()
        .url(format!("{}/upload", server.uri()))
        .upload(file_path.clone())
        .send("PUT")
        .await
        .unwrap();
    assert_eq!(response.status, 201);

    let received = server.received_requests().await.unwrap();
    let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
    let parts = parse_multipart(received[0].body.clone(), content_type).await;

    assert_eq!(
        parts,
        vec![Part {
            name: Some(file_path.clone()),
            file_name: Some(file_path),
            content_type: Some("application/octet-stream".to_string()),
            content: b"hello".to_vec(),
        }]
    );
}

#[tokio::test]
async fn test_missing_upload_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.bin");

    let client = EzApiClient::new().unwrap();
    let err = client
        .request()
        .url(server.uri())
        .upload(missing.to_str().unwrap())
        .send("POST")
        .await
        .unwrap_err();

    assert!(matches!(err, EzApiError::Upload { .. }));
}

#[tokio::test]
async fn test_user_content_type_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/merge-patch+json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    client
        .request()
        .url(server.uri())
        .json(r#"{"op":"x"}"#)
        .headers(&Values::from([("Content-Type", "application/merge-patch+json")]))
        .send("POST")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_returned_as_data() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    let response = client
        .request()
        .url(server.uri())
        .send("DELETE")
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.text(), "busy");
}

#[tokio::test]
async fn test_slow_server_exceeds_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = EzApiClient::new().unwrap();
    let err = client
        .request()
        .url(server.uri())
        .timeout(1)
        .send("GET")
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected deadline error, got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Bind and drop a listener so the port is closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = EzApiClient::new().unwrap();
    let err = client
        .request()
        .url(format!("http://{}/", addr))
        .send("GET")
        .await
        .unwrap_err();

    assert!(matches!(err, EzApiError::Transport(TransportError::Connection { .. })));
}
