#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Canned HTTP responses keyed by request path.
#[derive(Clone, Default)]
pub struct Routes(Arc<Mutex<HashMap<String, (u16, Vec<u8>)>>>);

impl Routes {
    pub fn set(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.0
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    fn lookup(&self, path: &str) -> (u16, Vec<u8>) {
        self.0
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or((404, Vec::new()))
    }
}

/// Serves `routes` on an ephemeral localhost port until the test process exits.
pub fn serve(routes: Routes) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = routes.clone();
            thread::spawn(move || handle(stream, &routes));
        }
    });
    port
}

/// A port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn handle(mut stream: TcpStream, routes: &Routes) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, body) = routes.lookup(&path);
    let header = format!(
        "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
}
