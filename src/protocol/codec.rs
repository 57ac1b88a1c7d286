//! Protocol codec
//!
//! Encoding and decoding functions for the line protocol.
//!
//! ## Wire Format
//!
//! Every message is one UTF-8 line terminated by `\n` (a preceding `\r` is
//! tolerated on input).
//!
//! ### Requests
//! ```text
//! PUT <key> <value...>
//! GET <key>
//! DELETE <key>        (alias: DEL)
//! PING
//! ```
//! The verb is case-insensitive. The PUT value is everything after the
//! space that follows the key, so it may contain spaces or be empty.
//!
//! ### Responses
//! ```text
//! OK | VALUE <value> | NOT_FOUND | PONG | ERROR <message>
//! ```

use std::io::{self, BufRead, Read, Write};
use std::mem;

use super::{Command, Response};
use crate::error::{GateError, Result};

/// Maximum line length in bytes, excluding the terminator (64 KiB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as a request line (without terminator)
///
/// Keys may not contain whitespace and values may not contain line breaks,
/// since neither could be decoded back.
pub fn encode_command(command: &Command) -> Result<String> {
    let verb = command.command_type().verb();

    let line = match command {
        Command::Get { key } | Command::Delete { key } => match key {
            Some(key) => {
                check_key(key)?;
                format!("{} {}", verb, key)
            }
            None => verb.to_string(),
        },
        Command::Put { key, value } => {
            let key = key.as_deref().unwrap_or("");
            check_key(key)?;
            match value {
                Some(value) => {
                    check_value(value)?;
                    format!("{} {} {}", verb, key, value)
                }
                None if key.is_empty() => verb.to_string(),
                None => format!("{} {}", verb, key),
            }
        }
        Command::Ping => verb.to_string(),
    };

    Ok(line)
}

/// Decode a request line
///
/// Missing or empty arguments decode to `None`; the verb itself must be known.
pub fn decode_command(line: &str) -> Result<Command> {
    let line = strip_terminator(line).trim_start();

    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, Some(rest)),
        None => (line, None),
    };

    if verb.is_empty() {
        return Err(GateError::Protocol("empty request".to_string()));
    }

    match verb.to_ascii_uppercase().as_str() {
        "GET" => Ok(Command::Get {
            key: single_argument("GET", rest)?,
        }),
        "DELETE" | "DEL" => Ok(Command::Delete {
            key: single_argument("DELETE", rest)?,
        }),
        "PUT" => {
            let (key, value) = match rest {
                Some(rest) => match rest.split_once(' ') {
                    Some((key, value)) => (non_empty(key), Some(value.to_string())),
                    None => (non_empty(rest), None),
                },
                None => (None, None),
            };
            Ok(Command::Put { key, value })
        }
        "PING" => match rest.map(str::trim) {
            None | Some("") => Ok(Command::Ping),
            Some(_) => Err(GateError::Protocol(
                "PING takes no arguments".to_string(),
            )),
        },
        _ => Err(GateError::Protocol(format!("unknown command: {}", verb))),
    }
}

fn single_argument(verb: &str, rest: Option<&str>) -> Result<Option<String>> {
    let rest = rest.map(str::trim).unwrap_or("");
    if rest.contains(char::is_whitespace) {
        return Err(GateError::Protocol(format!(
            "{} takes a single key",
            verb
        )));
    }
    Ok(non_empty(rest))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn check_key(key: &str) -> Result<()> {
    if key.contains(char::is_whitespace) {
        return Err(GateError::Protocol(format!(
            "key {:?} contains whitespace",
            key
        )));
    }
    Ok(())
}

fn check_value(value: &str) -> Result<()> {
    if value.contains(|c: char| c == '\r' || c == '\n') {
        return Err(GateError::Protocol(
            "value contains a line break".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as a reply line (without terminator)
pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Ok => "OK".to_string(),
        Response::Value(value) => format!("VALUE {}", value),
        Response::NotFound => "NOT_FOUND".to_string(),
        Response::Pong => "PONG".to_string(),
        Response::Error(message) => format!("ERROR {}", message),
    }
}

/// Decode a reply line
pub fn decode_response(line: &str) -> Result<Response> {
    let line = strip_terminator(line);

    match line {
        "OK" => return Ok(Response::Ok),
        "NOT_FOUND" => return Ok(Response::NotFound),
        "PONG" => return Ok(Response::Pong),
        "VALUE" => return Ok(Response::Value(String::new())),
        "ERROR" => return Ok(Response::Error(String::new())),
        _ => {}
    }

    if let Some(value) = line.strip_prefix("VALUE ") {
        return Ok(Response::Value(value.to_string()));
    }
    if let Some(message) = line.strip_prefix("ERROR ") {
        return Ok(Response::Error(message.to_string()));
    }

    Err(GateError::Protocol(format!(
        "unknown response: {:?}",
        line
    )))
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one raw line from a stream, without its terminator
///
/// Bytes of an unfinished line are kept in `pending`, so a read that fails
/// with `WouldBlock` or `TimedOut` can be retried without losing data. A
/// clean end of stream before any byte is reported as an `UnexpectedEof` I/O
/// error. A final line without terminator is accepted.
pub fn read_line_bytes<R: BufRead>(reader: &mut R, pending: &mut Vec<u8>) -> Result<Vec<u8>> {
    // Room for the longest allowed line plus "\r\n"
    let limit = (MAX_LINE_LEN + 2).saturating_sub(pending.len());
    let read = reader.by_ref().take(limit as u64).read_until(b'\n', pending)?;

    if read == 0 && pending.is_empty() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed").into());
    }

    let mut line = mem::take(pending);
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }

    if line.len() > MAX_LINE_LEN {
        return Err(GateError::Protocol(format!(
            "line exceeds {} bytes",
            MAX_LINE_LEN
        )));
    }

    Ok(line)
}

/// Read one UTF-8 line from a stream, without its terminator
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut pending = Vec::new();
    let line = read_line_bytes(reader, &mut pending)?;
    String::from_utf8(line).map_err(|_| GateError::Protocol("line is not valid UTF-8".to_string()))
}

/// Write one line and flush
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read and decode a complete command from a stream
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Command> {
    let line = read_line(reader)?;
    decode_command(&line)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let line = encode_command(command)?;
    write_line(writer, &line)
}

/// Read and decode a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let line = read_line(reader)?;
    decode_response(&line)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_line(writer, &encode_response(response))
}
