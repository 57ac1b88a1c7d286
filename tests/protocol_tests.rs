//! Codec Tests
//!
//! Tests for request and reply line encoding/decoding.

use std::collections::VecDeque;
use std::io::{self, BufReader, Cursor, Read};

use gatekv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command, read_line,
    read_line_bytes, read_response, write_command, write_response, Command, CommandType, Response,
    MAX_LINE_LEN,
};
use gatekv::GateError;

// =============================================================================
// Command Decoding Tests
// =============================================================================

#[test]
fn test_decode_get() {
    assert_eq!(decode_command("GET hello").unwrap(), Command::get("hello"));
}

#[test]
fn test_decode_put_value_keeps_spaces() {
    assert_eq!(
        decode_command("PUT greeting hello big world").unwrap(),
        Command::put("greeting", "hello big world")
    );
}

#[test]
fn test_decode_put_empty_value() {
    assert_eq!(decode_command("PUT key ").unwrap(), Command::put("key", ""));
}

#[test]
fn test_decode_delete_and_alias() {
    assert_eq!(decode_command("DELETE key").unwrap(), Command::delete("key"));
    assert_eq!(decode_command("DEL key").unwrap(), Command::delete("key"));
}

#[test]
fn test_decode_ping() {
    assert_eq!(decode_command("PING").unwrap(), Command::Ping);
}

#[test]
fn test_decode_is_case_insensitive() {
    assert_eq!(decode_command("get k").unwrap(), Command::get("k"));
    assert_eq!(decode_command("Put k v").unwrap(), Command::put("k", "v"));
    assert_eq!(decode_command("ping").unwrap(), Command::Ping);
}

#[test]
fn test_decode_strips_terminators() {
    assert_eq!(decode_command("GET k\r\n").unwrap(), Command::get("k"));
    assert_eq!(decode_command("PUT k v\n").unwrap(), Command::put("k", "v"));
}

#[test]
fn test_decode_missing_arguments_become_none() {
    assert_eq!(decode_command("GET").unwrap(), Command::Get { key: None });
    assert_eq!(decode_command("GET ").unwrap(), Command::Get { key: None });
    assert_eq!(decode_command("DELETE").unwrap(), Command::Delete { key: None });
    assert_eq!(
        decode_command("PUT").unwrap(),
        Command::Put {
            key: None,
            value: None,
        }
    );
    assert_eq!(
        decode_command("PUT key").unwrap(),
        Command::Put {
            key: Some("key".to_string()),
            value: None,
        }
    );
    assert_eq!(
        decode_command("PUT  value").unwrap(),
        Command::Put {
            key: None,
            value: Some("value".to_string()),
        }
    );
}

#[test]
fn test_decode_rejects_unknown_verb() {
    let err = decode_command("FETCH key").unwrap_err();
    assert!(matches!(err, GateError::Protocol(_)));
}

#[test]
fn test_decode_rejects_empty_line() {
    assert!(matches!(decode_command(""), Err(GateError::Protocol(_))));
    assert!(matches!(decode_command("   "), Err(GateError::Protocol(_))));
}

#[test]
fn test_decode_rejects_extra_arguments() {
    assert!(matches!(decode_command("GET a b"), Err(GateError::Protocol(_))));
    assert!(matches!(decode_command("DEL a b"), Err(GateError::Protocol(_))));
    assert!(matches!(decode_command("PING now"), Err(GateError::Protocol(_))));
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_commands() {
    assert_eq!(encode_command(&Command::get("k")).unwrap(), "GET k");
    assert_eq!(encode_command(&Command::put("k", "v w")).unwrap(), "PUT k v w");
    assert_eq!(encode_command(&Command::delete("k")).unwrap(), "DELETE k");
    assert_eq!(encode_command(&Command::Ping).unwrap(), "PING");
}

#[test]
fn test_encode_missing_arguments() {
    assert_eq!(encode_command(&Command::Get { key: None }).unwrap(), "GET");
    assert_eq!(
        encode_command(&Command::Put {
            key: None,
            value: None,
        })
        .unwrap(),
        "PUT"
    );
    assert_eq!(
        encode_command(&Command::Put {
            key: Some("k".to_string()),
            value: None,
        })
        .unwrap(),
        "PUT k"
    );
}

#[test]
fn test_encode_rejects_unframeable_input() {
    assert!(matches!(
        encode_command(&Command::get("two words")),
        Err(GateError::Protocol(_))
    ));
    assert!(matches!(
        encode_command(&Command::put("k", "line\nbreak")),
        Err(GateError::Protocol(_))
    ));
}

#[test]
fn test_command_type_verbs() {
    assert_eq!(Command::get("k").command_type(), CommandType::Get);
    assert_eq!(CommandType::Delete.verb(), "DELETE");
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_responses() {
    assert_eq!(encode_response(&Response::Ok), "OK");
    assert_eq!(encode_response(&Response::Value("v".to_string())), "VALUE v");
    assert_eq!(encode_response(&Response::NotFound), "NOT_FOUND");
    assert_eq!(encode_response(&Response::Pong), "PONG");
    assert_eq!(encode_response(&Response::error("bad")), "ERROR bad");
}

#[test]
fn test_decode_responses() {
    assert_eq!(decode_response("OK").unwrap(), Response::Ok);
    assert_eq!(decode_response("NOT_FOUND\r\n").unwrap(), Response::NotFound);
    assert_eq!(decode_response("PONG").unwrap(), Response::Pong);
    assert_eq!(
        decode_response("VALUE hello world").unwrap(),
        Response::Value("hello world".to_string())
    );
    assert_eq!(
        decode_response("ERROR unknown command: X").unwrap(),
        Response::Error("unknown command: X".to_string())
    );
}

#[test]
fn test_decode_empty_value_response() {
    let line = encode_response(&Response::Value(String::new()));
    assert_eq!(decode_response(&line).unwrap(), Response::Value(String::new()));
    assert_eq!(decode_response("VALUE").unwrap(), Response::Value(String::new()));
}

#[test]
fn test_decode_unknown_response() {
    assert!(matches!(decode_response("MAYBE"), Err(GateError::Protocol(_))));
}

// =============================================================================
// Stream-based I/O Tests
// =============================================================================

#[test]
fn test_write_then_read_command_over_stream() {
    let mut buffer = Vec::new();
    write_command(&mut buffer, &Command::put("k", "v")).unwrap();
    write_command(&mut buffer, &Command::Ping).unwrap();
    assert_eq!(buffer, b"PUT k v\nPING\n");

    let mut reader = BufReader::new(Cursor::new(buffer));
    assert_eq!(read_command(&mut reader).unwrap(), Command::put("k", "v"));
    assert_eq!(read_command(&mut reader).unwrap(), Command::Ping);
}

#[test]
fn test_write_then_read_response_over_stream() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::Value("v".to_string())).unwrap();

    let mut reader = BufReader::new(Cursor::new(buffer));
    assert_eq!(
        read_response(&mut reader).unwrap(),
        Response::Value("v".to_string())
    );
}

#[test]
fn test_read_line_eof_is_unexpected_eof() {
    let mut reader = BufReader::new(Cursor::new(Vec::new()));
    match read_line(&mut reader) {
        Err(GateError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected EOF error, got {:?}", other),
    }
}

#[test]
fn test_read_line_accepts_unterminated_last_line() {
    let mut reader = BufReader::new(Cursor::new(b"PING".to_vec()));
    assert_eq!(read_line(&mut reader).unwrap(), "PING");
}

#[test]
fn test_read_line_strips_crlf() {
    let mut reader = BufReader::new(Cursor::new(b"GET a\r\nGET b\n".to_vec()));
    assert_eq!(read_line(&mut reader).unwrap(), "GET a");
    assert_eq!(read_line(&mut reader).unwrap(), "GET b");
}

#[test]
fn test_read_line_at_limit_is_accepted() {
    let mut data = vec![b'a'; MAX_LINE_LEN];
    data.push(b'\n');
    let mut reader = BufReader::new(Cursor::new(data));

    assert_eq!(read_line(&mut reader).unwrap().len(), MAX_LINE_LEN);
}

#[test]
fn test_read_line_crlf_at_limit_is_accepted() {
    let mut data = vec![b'a'; MAX_LINE_LEN];
    data.extend_from_slice(b"\r\nPING\n");
    let mut reader = BufReader::new(Cursor::new(data));

    assert_eq!(read_line(&mut reader).unwrap().len(), MAX_LINE_LEN);
    assert_eq!(read_line(&mut reader).unwrap(), "PING");
}

#[test]
fn test_read_line_one_past_limit_is_rejected() {
    let mut data = vec![b'a'; MAX_LINE_LEN + 1];
    data.push(b'\n');
    let mut reader = BufReader::new(Cursor::new(data));

    assert!(matches!(read_line(&mut reader), Err(GateError::Protocol(_))));
}

#[test]
fn test_read_line_over_limit_is_rejected() {
    let mut data = vec![b'a'; MAX_LINE_LEN + 10];
    data.push(b'\n');
    let mut reader = BufReader::new(Cursor::new(data));

    assert!(matches!(read_line(&mut reader), Err(GateError::Protocol(_))));
}

#[test]
fn test_read_line_rejects_invalid_utf8() {
    let mut reader = BufReader::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
    assert!(matches!(read_line(&mut reader), Err(GateError::Protocol(_))));
}

/// Reader that hands out scripted chunks; `None` fails with `WouldBlock`
struct StutteringReader {
    chunks: VecDeque<Option<&'static [u8]>>,
}

impl Read for StutteringReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(Some(chunk)) => {
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
            Some(None) => Err(io::Error::new(io::ErrorKind::WouldBlock, "no data yet")),
            None => Ok(0),
        }
    }
}

#[test]
fn test_read_line_bytes_keeps_partial_line_across_timeouts() {
    let chunks = vec![
        Some(&b"PUT k "[..]),
        None,
        Some(&b"v\r"[..]),
        None,
        Some(&b"\nGET k\n"[..]),
    ];
    let mut reader = BufReader::new(StutteringReader {
        chunks: chunks.into_iter().collect(),
    });
    let mut pending = Vec::new();

    let first = read_line_bytes(&mut reader, &mut pending).unwrap_err();
    assert!(matches!(first, GateError::Io(ref e) if e.kind() == io::ErrorKind::WouldBlock));
    assert_eq!(pending, b"PUT k ");

    assert!(read_line_bytes(&mut reader, &mut pending).is_err());
    assert_eq!(pending, b"PUT k v\r");

    assert_eq!(read_line_bytes(&mut reader, &mut pending).unwrap(), b"PUT k v");
    assert!(pending.is_empty());
    assert_eq!(read_line_bytes(&mut reader, &mut pending).unwrap(), b"GET k");
}

#[test]
fn test_read_line_bytes_returns_invalid_utf8_untouched() {
    let mut reader = BufReader::new(Cursor::new(vec![0xff, 0xfe, b'\n']));
    let mut pending = Vec::new();

    assert_eq!(read_line_bytes(&mut reader, &mut pending).unwrap(), vec![0xff, 0xfe]);
}
