use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::api::dto::{CompileRequest, CompileResponse};
use crate::application::CompileService;
use crate::infrastructure::config::ServerConfig;

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<serde_json::Value>,
}

pub fn start_server(config: &ServerConfig, service: Arc<CompileService>) -> Result<()> {
    let address = config.address();
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("[API] Server listening on {}", address);
    serve(listener, service)
}

/// Accept connections forever, one thread per connection.
pub fn serve(listener: TcpListener, service: Arc<CompileService>) -> Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &service) {
                        warn!("[API] Connection error: {}", e);
                    }
                });
            }
            Err(e) => error!("[API] Accept error: {}", e),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, service: &CompileService) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match process_command(trimmed, service) {
            Ok(data) => json!({
                "status": "success",
                "data": data
            }),
            Err(e) => json!({
                "status": "error",
                "message": e.to_string()
            }),
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if let Ok(req) = serde_json::from_str::<CommandReq>(trimmed) {
            if req.command == "SHUTDOWN" {
                info!("[API] Shutdown requested.");
                std::process::exit(0);
            }
        }
    }
    Ok(())
}

fn process_command(json_str: &str, service: &CompileService) -> Result<serde_json::Value> {
    let req: CommandReq = serde_json::from_str(json_str)
        .context("Invalid JSON format")?;

    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "COMPILE" => handle_compile(req.params, service),
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn handle_compile(params: Option<serde_json::Value>, service: &CompileService) -> Result<serde_json::Value> {
    let request: CompileRequest = match params {
        Some(params) => serde_json::from_value(params).context("Invalid COMPILE params")?,
        None => CompileRequest::default(),
    };
    debug!("[API] COMPILE {}", request.language());

    let result = service.compile_request(request.language(), request.code.as_deref())?;
    Ok(serde_json::to_value(CompileResponse::from(result))?)
}
