//! One-shot HTTP responder for exercising the Marketing Cloud client.

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct StubResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl StubServer {
    /// The raw requests received, in order. Waits for every queued response
    /// to be served.
    pub async fn requests(self) -> Vec<String> {
        self.handle.await.expect("stub server task")
    }
}

/// Serves `responses` in order, one connection each.
pub async fn start(responses: Vec<StubResponse>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.expect("accept");
            requests.push(read_request(&mut stream).await);

            let head = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.body.len()
            );
            stream.write_all(head.as_bytes()).await.expect("write head");
            stream
                .write_all(response.body.as_bytes())
                .await
                .expect("write body");
            let _ = stream.shutdown().await;
        }
        requests
    });

    StubServer { base_url, handle }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let read = stream.read(&mut chunk).await.expect("read request");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= end + 4 + body_len {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}
