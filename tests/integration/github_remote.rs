//! GitHub contents API client against a local canned-response server

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use canopy::error::SyncError;
use canopy::sync::{Credential, GitHubRemote, RemoteCollaborator, RemoteRef};
use canopy::tree::{NodeKind, Snapshot, Tree};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// One raw request as received: request line, headers, body.
#[derive(Debug, Clone)]
struct Recorded {
    head: String,
    body: String,
}

impl Recorded {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serve `responses` in order, one connection each, and record the requests.
fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&mut stream);
            sink.lock().unwrap().push(request);
            let reason = match status {
                200 => "OK",
                201 => "Created",
                401 => "Unauthorized",
                404 => "Not Found",
                _ => "Error",
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (base, recorded)
}

fn read_request(stream: &mut std::net::TcpStream) -> Recorded {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break data.len();
        }
        data.extend_from_slice(&chunk[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let length = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while data.len() < head_end + length {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&data[head_end..]).into_owned();
    Recorded { head, body }
}

fn remote() -> RemoteRef {
    "octo/project".parse().unwrap()
}

fn credential() -> Credential {
    Credential::from_token(Some("tok-123")).unwrap()
}

fn client(base: &str, branch: Option<&str>) -> GitHubRemote {
    GitHubRemote::new(
        Some(base.to_string()),
        branch.map(str::to_string),
        "project.json",
    )
    .unwrap()
}

fn contents_body(sha: &str, snapshot: &Snapshot) -> String {
    // Wrapped at 60 columns like the real API.
    let encoded = STANDARD.encode(snapshot.as_str());
    let wrapped: Vec<String> = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    serde_json::json!({
        "type": "file",
        "sha": sha,
        "encoding": "base64",
        "content": wrapped.join("\n"),
    })
    .to_string()
}

fn sample_snapshot() -> Snapshot {
    Tree::empty()
        .create(None, "index.js", NodeKind::File)
        .unwrap()
        .update("index.js", "console.log(\"hi\")")
        .unwrap()
        .serialize()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_contents_on_branch() {
    let snapshot = sample_snapshot();
    let (base, recorded) = serve(vec![(200, contents_body("abc123", &snapshot))]);

    let fetched = client(&base, Some("main"))
        .fetch_tree_snapshot(&remote(), &credential())
        .await
        .unwrap();
    assert_eq!(fetched, snapshot);

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].request_line(),
        "GET /repos/octo/project/contents/project.json?ref=main HTTP/1.1"
    );
    assert_eq!(
        requests[0].header("authorization").as_deref(),
        Some("Bearer tok-123")
    );
    assert_eq!(
        requests[0].header("x-github-api-version").as_deref(),
        Some("2022-11-28")
    );
}

#[tokio::test]
async fn test_commit_creates_file_when_missing() {
    let (base, recorded) = serve(vec![
        (404, r#"{"message": "Not Found"}"#.to_string()),
        (201, r#"{"content": {}, "commit": {"sha": "c0ffee"}}"#.to_string()),
    ]);
    let snapshot = sample_snapshot();

    let ack = client(&base, None)
        .apply_commit(&remote(), &credential(), &snapshot, "Initial import")
        .await
        .unwrap();
    assert_eq!(ack.revision.as_deref(), Some("c0ffee"));

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].request_line().starts_with("GET "));
    assert_eq!(
        requests[1].request_line(),
        "PUT /repos/octo/project/contents/project.json HTTP/1.1"
    );
    let body = requests[1].json();
    assert_eq!(body["message"], "Initial import");
    assert!(body.get("sha").is_none());
    assert!(body.get("branch").is_none());
    let content = STANDARD
        .decode(body["content"].as_str().unwrap())
        .unwrap();
    assert_eq!(String::from_utf8(content).unwrap(), snapshot.as_str());
}

#[tokio::test]
async fn test_commit_overwrites_existing_blob() {
    let previous = Tree::empty().serialize().unwrap();
    let (base, recorded) = serve(vec![
        (200, contents_body("old-sha", &previous)),
        (200, r#"{"commit": {"sha": "feed"}}"#.to_string()),
    ]);

    client(&base, Some("dev"))
        .apply_commit(&remote(), &credential(), &sample_snapshot(), "Update files")
        .await
        .unwrap();

    let requests = recorded.lock().unwrap().clone();
    let body = requests[1].json();
    assert_eq!(body["sha"], "old-sha");
    assert_eq!(body["branch"], "dev");
}

#[tokio::test]
async fn test_rejected_credential_is_auth_error() {
    let (base, _) = serve(vec![(401, r#"{"message": "Bad credentials"}"#.to_string())]);
    let err = client(&base, None)
        .fetch_tree_snapshot(&remote(), &credential())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::RemoteAuth(_)), "{:?}", err);
}

#[tokio::test]
async fn test_missing_snapshot_file_is_not_found() {
    let (base, _) = serve(vec![(404, r#"{"message": "Not Found"}"#.to_string())]);
    let err = client(&base, None)
        .fetch_tree_snapshot(&remote(), &credential())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::RemoteNotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn test_unreachable_host_is_remote_error() {
    // Bind then drop to get a port nobody is listening on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client(&format!("http://127.0.0.1:{}", port), None)
        .fetch_tree_snapshot(&remote(), &credential())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Remote(_)), "{:?}", err);
}
