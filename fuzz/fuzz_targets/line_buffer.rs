//! Fuzz target for LineBuffer reassembly
//!
//! Feeds arbitrarily-fragmented chunks through the reassembler to find:
//! - Panics on odd delimiter placement (split CRLF, lone CR/LF)
//! - Violations of the no-complete-line-left-pending invariant
//! - Pending fragments left over the configured ceiling

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relay_proto::LineBuffer;

#[derive(Debug, Arbitrary)]
struct Input {
    limit: Option<u16>,
    chunks: Vec<String>,
}

fuzz_target!(|input: Input| {
    let mut buf = match input.limit {
        Some(limit) => LineBuffer::with_limit(limit as usize),
        None => LineBuffer::new(),
    };

    for chunk in &input.chunks {
        let _ = buf.push(chunk);

        // Every complete line was extracted by the push.
        assert!(!buf.pending().contains("\r\n"));

        // A configured ceiling is never left exceeded.
        if let Some(limit) = input.limit {
            assert!(buf.pending().len() <= limit as usize);
        }
    }
});
