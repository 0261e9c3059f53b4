use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use codesync_core::{Credentials, RemotePath};
use codesync_sync::{FetchError, GitHubFetcher, SourceFetcher};

/// Serve one HTTP request with `status` and `body`, returning the base URL
/// and a receiver for the raw request head.
fn serve_once(status: &'static str, body: String) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read") == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write");
        let _ = tx.send(head);
    });

    (format!("http://{addr}"), rx)
}

fn credentials(api_root: String) -> Credentials {
    Credentials {
        api_root,
        git_ref: "v2".to_string(),
        token: "secret-token".to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn remote() -> RemotePath {
    RemotePath::parse("https://github.com/owner/repo/blob/main/sub/file.py").expect("remote")
}

#[test]
fn fetches_and_decodes_file_contents() {
    let _ = env_logger::builder().is_test(true).try_init();
    let body = serde_json::json!({
        "name": "file.py",
        "encoding": "base64",
        "content": "YQpi\nCmM=\n",
    })
    .to_string();
    let (root, requests) = serve_once("200 OK", body);

    let fetcher = GitHubFetcher::new(credentials(root));
    let content = fetcher.fetch(&remote()).expect("fetch");
    assert_eq!(content, "a\nb\nc");

    let head = requests.recv_timeout(Duration::from_secs(5)).expect("request");
    let request_line = head.lines().next().unwrap_or_default();
    assert!(
        request_line.starts_with("GET /repos/owner/repo/contents/sub/file.py?ref=v2 "),
        "unexpected request line: {request_line}"
    );
    let lower = head.to_ascii_lowercase();
    assert!(lower.contains("authorization: bearer secret-token"));
    assert!(lower.contains("accept: application/vnd.github.v3+json"));
}

#[test]
fn http_error_status_is_reported() {
    let (root, _requests) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#.to_string());
    let fetcher = GitHubFetcher::new(credentials(root));
    let err = fetcher.fetch(&remote()).unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 404, .. }),
        "unexpected error: {err:?}"
    );
}

#[test]
fn malformed_body_is_a_decode_error() {
    let (root, _requests) = serve_once("200 OK", r#"{"unexpected":true}"#.to_string());
    let fetcher = GitHubFetcher::new(credentials(root));
    let err = fetcher.fetch(&remote()).unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }), "unexpected error: {err:?}");
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Bind then drop to obtain a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port();
    let fetcher = GitHubFetcher::new(credentials(format!("http://127.0.0.1:{port}")));
    let err = fetcher.fetch(&remote()).unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "unexpected error: {err:?}");
}
