//! Persistent TLS connection to the exchange streaming endpoint.
//!
//! The stream speaks CRLF-delimited JSON over a raw TLS socket. A handle
//! owns the socket together with its frame decoder, so tearing a
//! connection down also discards any partial frame it buffered; frames
//! never span connections. Reconnect policy lives with the caller.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::{RequestMessage, ResponseMessage};

use super::framing::FrameDecoder;

const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A connected stream handle. Created fresh per connection attempt.
pub struct ExchangeStream {
    tls: TlsStream<TcpStream>,
    decoder: FrameDecoder,
}

impl ExchangeStream {
    /// Opens TCP + TLS to the streaming endpoint.
    pub async fn connect(host: &str, port: u16) -> Result<Self, StreamError> {
        info!(host, port, "connecting to exchange stream");

        let tcp = TcpStream::connect((host, port)).await?;
        let connector = tokio_native_tls::TlsConnector::from(native_tls::TlsConnector::new()?);
        let tls = connector.connect(host, tcp).await?;

        info!(host, "stream connected");
        Ok(Self {
            tls,
            decoder: FrameDecoder::new(),
        })
    }

    /// Serializes a message and writes it with the frame terminator.
    pub async fn send(&mut self, message: &RequestMessage) -> Result<(), StreamError> {
        let mut line = serde_json::to_vec(message)?;
        line.extend_from_slice(b"\r\n");

        self.tls.write_all(&line).await?;
        self.tls.flush().await?;
        debug!(bytes = line.len(), "stream message sent");
        Ok(())
    }

    /// Next decoded message from the stream.
    ///
    /// Buffered frames are drained before the socket is read again.
    /// `Ok(None)` signals an orderly close. A frame that fails to parse is
    /// logged and skipped; decoding continues with the next frame.
    pub async fn next_message(&mut self) -> Result<Option<ResponseMessage>, StreamError> {
        loop {
            while let Some(frame) = self.decoder.next_frame() {
                if frame.trim().is_empty() {
                    continue;
                }
                if let Some(message) = decode_frame(&frame) {
                    return Ok(Some(message));
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self.tls.read(&mut chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.decoder.feed(&chunk[..n]);
        }
    }
}

impl std::fmt::Debug for ExchangeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeStream")
            .field("pending_bytes", &self.decoder.pending_len())
            .finish()
    }
}

/// Parses a single frame; a decode failure discards only that frame.
fn decode_frame(frame: &str) -> Option<ResponseMessage> {
    match serde_json::from_str::<ResponseMessage>(frame) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, frame, "discarding undecodable frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frame_valid() {
        let message = decode_frame(r#"{"op":"status","statusCode":"SUCCESS"}"#);
        assert!(matches!(message, Some(ResponseMessage::Status(_))));
    }

    #[test]
    fn test_decode_frame_malformed_is_skipped() {
        assert!(decode_frame("{not json").is_none());
        assert!(decode_frame(r#"{"op":"unknown-op"}"#).is_none());
    }
}
