use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Route {
    pub fn ok(path: &'static str, content_type: &'static str, body: impl Into<String>) -> Self {
        Route {
            path,
            status: 200,
            content_type,
            body: body.into(),
        }
    }

    pub fn status(path: &'static str, status: u16) -> Self {
        Route {
            path,
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

/// Serves `routes` on a loopback port until the test process exits.
/// Unknown paths answer 404. Returns the base URL, e.g. `http://127.0.0.1:4711`.
pub fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if header == "\r\n" || header == "\n" => break,
                    Ok(_) => {}
                }
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let response = match routes.iter().find(|r| r.path == path) {
                Some(route) => format!(
                    "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    route.status,
                    route.content_type,
                    route.body.len(),
                    route.body
                ),
                None => {
                    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                }
            };
            let _ = stream.write_all(response.as_bytes());
        }
    });
    base
}
