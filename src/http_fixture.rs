//! Loopback HTTP server for client tests. Each canned response answers one
//! connection; the raw requests are handed back when the thread is joined.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

pub struct CannedResponse {
    status_line: String,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl CannedResponse {
    pub fn new(status_line: &str, content_type: &'static str, body: &str) -> Self {
        Self {
            status_line: status_line.to_string(),
            content_type,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn xml(body: &str) -> Self {
        Self::new("200 OK", "text/xml", body)
    }

    pub fn text(body: &str) -> Self {
        Self::new("200 OK", "text/plain", body)
    }

    /// Waits before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_line,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

fn answer(listener: &TcpListener, response: &CannedResponse) -> String {
    let (stream, _) = listener.accept().expect("accept");
    let mut reader = BufReader::new(stream);
    let mut request = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
        request.push_str(&line);
        if line == "\r\n" || line.is_empty() {
            break;
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("body");
    request.push_str(&String::from_utf8_lossy(&body));
    thread::sleep(response.delay);
    // The client may have hung up after a timeout.
    reader.get_mut().write_all(response.to_http().as_bytes()).ok();
    request
}

/// Answers `responses` in order, one connection each.
pub fn serve(responses: Vec<CannedResponse>) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    let handle = thread::spawn(move || {
        responses
            .iter()
            .map(|response| answer(&listener, response))
            .collect()
    });
    (url, handle)
}

/// Serves one JSON response and returns the raw request it saw.
pub fn one_shot_server(status_line: &str, body: &str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    let response = CannedResponse::new(status_line, "application/json", body);
    let handle = thread::spawn(move || answer(&listener, &response));
    (url, handle)
}
