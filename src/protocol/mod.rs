//! Protocol Module
//!
//! Defines the line protocol for client-server communication.
//!
//! ### Commands
//! - `PUT <key> <value>`
//! - `GET <key>`
//! - `DELETE <key>` (alias `DEL`)
//! - `PING`
//!
//! ### Responses
//! - `OK`
//! - `VALUE <value>`
//! - `NOT_FOUND`
//! - `PONG`
//! - `ERROR <message>`

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::Response;
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command, read_line,
    read_line_bytes, read_response, write_command, write_line, write_response, MAX_LINE_LEN,
};
