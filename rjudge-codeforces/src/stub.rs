//! Scripted http server for exercising the adapter without the network.

use std::io::{BufRead as _, BufReader, Read as _, Write as _};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Url;

use rjudge_util::service::{CookieStorage, Session};

use crate::page;

/// Answers one connection per scripted response, in order, then stops.
pub struct StubServer {
    base_url: Url,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(responses: Vec<String>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").context("Could not bind stub server")?;
        let base_url = Url::parse(&format!("http://{}/", listener.local_addr()?))?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for response in responses {
                let mut stream = match listener.accept() {
                    Ok((stream, _)) => stream,
                    Err(_) => return,
                };
                if let Ok(request) = read_request(&mut stream) {
                    recorded.lock().unwrap().push(request);
                }
                stream.write_all(response.as_bytes()).ok();
            }
        });
        Ok(Self { base_url, requests })
    }

    /// Session against this server that never retries.
    pub fn session(&self) -> anyhow::Result<Session> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(5))
            .build()?;
        let session = Session::new(
            client,
            self.base_url.clone(),
            CookieStorage::in_memory(),
            page::extract_csrf_token,
        )
        .with_retry(0, Duration::from_millis(1));
        Ok(session)
    }

    /// Received requests as `"{method} {target}\n{body}"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn response(status: &str, headers: &[&str], body: &str) -> String {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for header in headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

fn read_request(stream: &mut TcpStream) -> anyhow::Result<String> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse()?;
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    Ok(format!("{} {}\n{}", method, target, String::from_utf8(body)?))
}
