#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Answers one request per canned `(status, body)` pair, in order, then stops.
pub struct StubServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl StubServer {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept should succeed");
                let mut reader = BufReader::new(stream);
                recorded.push(read_request(&mut reader));

                let mut stream = reader.into_inner();
                let response = format!(
                    "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream
                    .write_all(response.as_bytes())
                    .expect("response should be written");
            }
            recorded
        });

        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    pub fn requests(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("stub server thread should join")
    }
}

fn read_request(reader: &mut BufReader<std::net::TcpStream>) -> RecordedRequest {
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .expect("request line should be readable");

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header should be readable");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).expect("body should be readable");

    RecordedRequest {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8(body).expect("body should be utf-8"),
    }
}

pub fn reply_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

pub fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "gemchat-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

/// Command for the binary with every setting it reads cleared, run from an
/// empty directory so no `.env` file leaks in.
pub fn gemchat_command(work_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gemchat"));
    cmd.current_dir(work_dir);
    for var in [
        "GEMINI_API_KEY",
        "MODEL",
        "MODEL_BASE_URL",
        "MODEL_TIMEOUT_SECS",
        "MODEL_TEMPERATURE",
        "MODEL_TOP_P",
        "MODEL_TOP_K",
        "MODEL_MAX_OUTPUT_TOKENS",
        "SYSTEM_PROMPT",
        "RUST_LOG",
        "LOG_FORMAT",
        "LOG_OUTPUT",
        "LOG_FILE_PATH",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

pub fn run_with_input(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run gemchat binary");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for gemchat")
}

/// `Chatbot:` lines of stdout with prompts stripped.
pub fn chatbot_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .replace("You: ", "")
        .lines()
        .filter(|line| line.starts_with("Chatbot: "))
        .map(str::to_string)
        .collect()
}
