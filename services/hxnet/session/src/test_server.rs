//! Loopback HTTP responder for transport tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .find_map(|line| {
                    let line = line.to_ascii_lowercase();
                    line.strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answer `count` requests with a fixed status line and body, returning the
/// raw request texts once done.
pub(crate) async fn serve(
    status: &'static str,
    body: &'static str,
    count: usize,
) -> (SocketAddr, JoinHandle<Vec<String>>) {
    serve_bytes(
        status,
        "Content-Type: text/plain; charset=utf-8\r\n",
        body.as_bytes().to_vec(),
        count,
    )
    .await
}

/// Like [`serve`], with extra header lines (each ending in `\r\n`) and a
/// body that need not be text.
pub(crate) async fn serve_bytes(
    status: &'static str,
    headers: &'static str,
    body: Vec<u8>,
    count: usize,
) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut seen = Vec::with_capacity(count);
        for _ in 0..count {
            let (mut stream, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut stream).await);

            let head = format!(
                "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                headers,
                body.len()
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(&body).await.unwrap();
            let _ = stream.shutdown().await;
        }
        seen
    });

    (addr, handle)
}

/// Accept one connection, read the request, and never answer
pub(crate) async fn serve_silent(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            read_request(&mut stream).await;
            tokio::time::sleep(hold).await;
        }
    });

    addr
}

/// An address nothing is listening on
pub(crate) async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
