//! Fuzz target for Message::parse
//!
//! The decoder is a total function: arbitrary input, including
//! garbage, must decode to a message without panicking, and the decoded
//! message must render back to a line without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_proto::Message;

fuzz_target!(|line: &str| {
    let msg = Message::parse(line);
    let _ = msg.source_nick();
    let _ = msg.to_line();
});
