//! TCP transport for the client.
//!
//! A thin layer that owns the socket and moves text chunks: a spawned reader
//! task feeds inbound chunks into a channel, writes go straight to the write
//! half. Protocol logic stays in the Sans-IO session.

use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
    task::AbortHandle,
};

/// Transport errors.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    /// Opening the connection failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Writing to the open connection failed.
    #[error("write failed: {0}")]
    Write(String),
}

/// Inbound transport notifications delivered to the dispatch loop.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A chunk of text arrived. Fragmentation is arbitrary; reassembly is
    /// the session's job.
    Data(String),

    /// The connection closed: `None` for a clean peer close, `Some` with
    /// the error text for a transport fault.
    Closed(Option<String>),
}

/// One open TCP connection.
pub(crate) struct Transport {
    /// Chunks and closure notifications from the reader task.
    pub(crate) inbound: mpsc::Receiver<Inbound>,
    writer: OwnedWriteHalf,
    reader: AbortHandle,
}

impl Transport {
    /// Dial the endpoint and spawn the reader task.
    pub(crate) async fn open(endpoint: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let _ = stream.set_nodelay(true);

        let (mut read_half, writer) = stream.into_split();
        let (tx, inbound) = mpsc::channel::<Inbound>(32);

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            let mut pending: Vec<u8> = Vec::new();
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => {
                        if !pending.is_empty() {
                            let leftover = String::from_utf8_lossy(&pending).into_owned();
                            let _ = tx.send(Inbound::Data(leftover)).await;
                        }
                        let _ = tx.send(Inbound::Closed(None)).await;
                        break;
                    },
                    Ok(n) => {
                        pending.extend_from_slice(&buf[..n]);
                        let ready = pending.len() - incomplete_tail(&pending);
                        if ready == 0 {
                            continue;
                        }
                        let complete: Vec<u8> = pending.drain(..ready).collect();
                        let chunk = String::from_utf8_lossy(&complete).into_owned();
                        if tx.send(Inbound::Data(chunk)).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => {
                        let _ = tx.send(Inbound::Closed(Some(e.to_string()))).await;
                        break;
                    },
                }
            }
        })
        .abort_handle();

        Ok(Self { inbound, writer, reader })
    }

    /// Write one line, appending the CRLF terminator.
    pub(crate) async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut framed = String::with_capacity(line.len() + 2);
        framed.push_str(line);
        framed.push_str("\r\n");

        self.writer
            .write_all(framed.as_bytes())
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    /// Flush and close the write half.
    pub(crate) async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
    }

    /// Stop the reader task.
    pub(crate) fn stop(&self) {
        self.reader.abort();
    }
}

/// Length of an incomplete UTF-8 sequence at the end of `bytes`, at most
/// three bytes.
///
/// A read may end mid-character; those bytes must wait for the rest of the
/// sequence in the next read instead of being decoded lossily. A complete
/// or invalid sequence at the end returns zero, so nothing is held back
/// longer than one character.
fn incomplete_tail(bytes: &[u8]) -> usize {
    // A lead byte sits at most three positions from the end.
    let Some(start) = bytes
        .iter()
        .enumerate()
        .rev()
        .take(3)
        .find(|(_, b)| **b & 0xC0 != 0x80)
        .map(|(i, _)| i)
    else {
        return 0;
    };

    let needed = match bytes[start] {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        // ASCII or an invalid lead: nothing to wait for.
        _ => return 0,
    };

    let tail = bytes.len() - start;
    if tail < needed { tail } else { 0 }
}
