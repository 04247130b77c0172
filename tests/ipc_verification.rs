use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use mini_compiler::api::server;
use mini_compiler::infrastructure::build_service;
use mini_compiler::infrastructure::config::Config;
use serde_json::Value;

/// Start a server with execution disabled on an ephemeral port.
fn start() -> (TcpStream, BufReader<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let service = Arc::new(build_service(&Config::default(), false));
    thread::spawn(move || {
        if let Err(e) = server::serve(listener, service) {
            eprintln!("Server failed: {}", e);
        }
    });

    let stream = TcpStream::connect(address).expect("Failed to connect to server");
    let reader = BufReader::new(stream.try_clone().unwrap());
    (stream, reader)
}

fn send(stream: &mut TcpStream, reader: &mut BufReader<TcpStream>, command: &str) -> Value {
    stream.write_all(command.as_bytes()).unwrap();
    stream.write_all(b"\n").unwrap();
    let mut response = String::new();
    reader.read_line(&mut response).unwrap();
    serde_json::from_str(&response).unwrap()
}

#[test]
fn test_ping() {
    let (mut stream, mut reader) = start();
    let response = send(&mut stream, &mut reader, r#"{"command": "PING"}"#);
    assert_eq!(response["status"], "success");
    assert_eq!(response["data"], "PONG");
}

#[test]
fn test_compile_c() {
    let (mut stream, mut reader) = start();
    let command = serde_json::json!({
        "command": "COMPILE",
        "params": {"language": "c", "code": "int x = 5; int main() { int y = x + 1; return y; }"}
    });
    let response = send(&mut stream, &mut reader, &command.to_string());

    assert_eq!(response["status"], "success");
    let data = &response["data"];
    assert_eq!(data["output"], "");
    assert_eq!(data["errors"], serde_json::json!([]));
    assert_eq!(data["ast"]["kind"], "Program");
    assert_eq!(data["ast"]["children"].as_array().unwrap().len(), 2);
    assert_eq!(data["symbolTable"]["x"]["scope"], "global");
    assert_eq!(data["symbolTable"]["main"]["kind"], "function");
    assert_eq!(data["symbolTable"]["y"]["scope"], "main");
}

#[test]
fn test_compile_javascript() {
    let (mut stream, mut reader) = start();
    let command = serde_json::json!({
        "command": "COMPILE",
        "params": {"language": "javascript", "code": "function hello() {}\nconst greeting = 'hi'"}
    });
    let response = send(&mut stream, &mut reader, &command.to_string());

    assert_eq!(response["status"], "success");
    assert_eq!(response["data"]["ast"]["type"], "program");
    assert_eq!(response["data"]["ast"]["children"][0]["loc"]["start"]["line"], 1);
    assert_eq!(response["data"]["symbolTable"]["hello"]["declaredType"], "function");
    assert_eq!(response["data"]["symbolTable"]["greeting"]["scope"], "global");
}

#[test]
fn test_validation_errors() {
    let (mut stream, mut reader) = start();

    let response = send(&mut stream, &mut reader, r#"{"command": "COMPILE", "params": {"language": "c", "code": "   "}}"#);
    assert_eq!(response["status"], "error");
    assert_eq!(response["message"], "No code provided");

    let response = send(&mut stream, &mut reader, r#"{"command": "COMPILE"}"#);
    assert_eq!(response["message"], "No code provided");

    let response = send(&mut stream, &mut reader, r#"{"command": "COMPILE", "params": {"language": "cobol", "code": "x"}}"#);
    assert_eq!(response["status"], "error");
    assert_eq!(response["message"], "Unknown language: cobol");

    let response = send(&mut stream, &mut reader, r#"{"command": "FLY"}"#);
    assert_eq!(response["message"], "Unknown command: FLY");

    let response = send(&mut stream, &mut reader, "not json");
    assert_eq!(response["message"], "Invalid JSON format");
}

#[test]
fn test_compile_javascript_syntax_error() {
    let (mut stream, mut reader) = start();
    let command = serde_json::json!({
        "command": "COMPILE",
        "params": {"language": "javascript", "code": "let ok = 1;\nlet broken = (ok + ;\n"}
    });
    let response = send(&mut stream, &mut reader, &command.to_string());

    assert_eq!(response["status"], "success");
    assert_eq!(response["data"]["errors"][0]["line"], 2);
    assert!(response["data"]["symbolTable"]["ok"].is_object());
}

// SHUTDOWN calls std::process::exit and would take the test runner down
// with it, so it is not exercised here.
