//! Loopback HTTP endpoints for exercising the network clients.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use reqwest::Url;

fn url_for(listener: &TcpListener) -> Url {
    Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap()
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = url_for(&listener);
    drop(listener);
    url
}

/// A server that takes connections but never answers. Keep the listener
/// alive for as long as requests should hang.
pub fn silent_server() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = url_for(&listener);
    (listener, url)
}

/// Answers a single request with `status` and a JSON `body`.
pub fn serve_once(status: &str, body: &str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = url_for(&listener);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();
    });
    url
}
