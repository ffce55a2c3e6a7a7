#![forbid(unsafe_code)]

use crate::{McpServer, SessionLog, parse_request};
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StdioMode {
    NewlineJson,
    ContentLength,
}

impl StdioMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::NewlineJson => "newline_json",
            Self::ContentLength => "content_length",
        }
    }
}

// MCP clients speak one of two stdio framings: newline-delimited JSON, or
// Content-Length headers followed by a blank line and a JSON body. The
// framing is detected once from the first non-empty line and kept for the
// whole session so responses never interleave styles.
fn detect_mode(line: &str) -> Option<StdioMode> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(StdioMode::NewlineJson);
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("content-length:") || lower.starts_with("content-type:") {
        return Some(StdioMode::ContentLength);
    }
    None
}

fn parse_content_length_header(line: &str) -> Option<usize> {
    let (key, value) = line.trim().split_once(':')?;
    if !key.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<usize>().ok()
}

fn read_content_length_frame(
    reader: &mut impl BufRead,
    mut header: String,
) -> std::io::Result<Option<Vec<u8>>> {
    const MAX_CONTENT_LENGTH_BYTES: usize = 16 * 1024 * 1024;

    let mut content_length: Option<usize> = parse_content_length_header(&header);

    loop {
        if header.trim_end().is_empty() {
            break;
        }
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            // EOF mid-header: treat as connection close.
            return Ok(None);
        }
        if content_length.is_none() {
            content_length = parse_content_length_header(&header);
        }
    }

    let Some(len) = content_length else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Missing Content-Length header",
        ));
    };
    if len > MAX_CONTENT_LENGTH_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Content-Length exceeds max allowed size",
        ));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

type WriteJson = fn(&mut std::io::StdoutLock<'_>, &Value) -> Result<(), Box<dyn std::error::Error>>;

fn write_newline_json(
    stdout: &mut std::io::StdoutLock<'_>,
    resp: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(stdout, "{}", serde_json::to_string(resp)?)?;
    stdout.flush()?;
    Ok(())
}

fn write_content_length_json(
    stdout: &mut std::io::StdoutLock<'_>,
    resp: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_vec(resp)?;
    write!(stdout, "Content-Length: {}\r\n\r\n", body.len())?;
    stdout.write_all(&body)?;
    stdout.flush()?;
    Ok(())
}

pub(crate) fn run_stdio(
    server: &mut McpServer,
    log: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();
    let mut mode: Option<StdioMode> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        let effective = match mode {
            Some(v) => v,
            None => {
                let Some(detected) = detect_mode(&line) else {
                    continue;
                };
                log.note_mode(detected.as_str(), &line);
                mode = Some(detected);
                detected
            }
        };

        match effective {
            StdioMode::NewlineJson => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                handle_frame(server, log, &mut stdout, raw.as_bytes(), write_newline_json)?;
            }
            StdioMode::ContentLength => {
                if line.trim().is_empty() {
                    continue;
                }
                let Some(body) = read_content_length_frame(&mut reader, line)? else {
                    break;
                };
                handle_frame(server, log, &mut stdout, &body, write_content_length_json)?;
            }
        }
    }

    Ok(())
}

fn handle_frame(
    server: &mut McpServer,
    log: &mut SessionLog,
    stdout: &mut std::io::StdoutLock<'_>,
    body: &[u8],
    write_json: WriteJson,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(resp) => {
            log.note_error(&describe_json_rpc_error(&resp));
            write_json(stdout, &resp)?;
            return Ok(());
        }
    };

    log.note_method(&request.method);
    if let Some(resp) = server.handle(request) {
        write_json(stdout, &resp)?;
    }
    Ok(())
}

fn describe_json_rpc_error(resp: &Value) -> String {
    resp.get("error")
        .and_then(|v| v.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("invalid request")
        .to_string()
}
