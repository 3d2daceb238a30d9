#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use tempfile::{TempDir, tempdir};

/// Environment variables that would redirect the binary or change its logging.
pub const SCRUBBED_ENV_VARS: &[&str] = &[
    "RUST_LOG",
    "PRICE_SHEET_ID",
    "PRICE_SHEET_GID",
    "BLOG_SHEET_ID",
    "BLOG_SHEET_GID",
    "PRODUCTS_SHEET_ID",
    "PRODUCTS_SHEET_GID",
    "PROMOTION_SHEET_URL",
    "TREND_SHEET_URL",
    "CATALOG_SHEETS_CACHE_DIR",
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// The binary under test with site configuration scrubbed from its environment.
pub fn catalog_sheets() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("catalog-sheets").expect("binary exists");
    for key in SCRUBBED_ENV_VARS {
        cmd.env_remove(key);
    }
    cmd
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// One canned HTTP response.
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Loopback HTTP server answering a fixed sequence of requests, one per connection.
pub struct StubServer {
    base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().expect("accept connection");
                requests.push(read_request_head(&mut stream));
                write_response(&mut stream, &response);
            }
            requests
        });
        Self { base_url, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Waits for every canned response to be served and returns the request heads.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("stub server thread")
    }
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buffer = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).expect("read request");
        if read == 0 {
            break;
        }
        head.extend_from_slice(&buffer[..read]);
    }
    String::from_utf8_lossy(&head).into_owned()
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) {
    let reason = match response.status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.body.len()
    );
    stream.write_all(head.as_bytes()).expect("write head");
    stream.write_all(&response.body).expect("write body");
    stream.flush().expect("flush response");
}
