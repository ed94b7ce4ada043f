//! CRLF frame decoding for the exchange stream.
//!
//! The transport delivers an undifferentiated byte stream; messages are
//! delimited by a two-byte CRLF terminator. The decoder buffers partial
//! frames across deliveries, so a frame is never split or duplicated no
//! matter how the bytes were chunked on the wire.

use bytes::{Buf, BytesMut};

const TERMINATOR: &[u8] = b"\r\n";

/// Stateful splitter turning raw byte chunks into complete frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Appends a delivery to the retained buffer.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pops the next complete frame, consuming its terminator.
    ///
    /// Returns `None` once only a partial frame (or nothing) remains; the
    /// remainder stays buffered for the next `feed`.
    pub fn next_frame(&mut self) -> Option<String> {
        let pos = self.buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)?;
        let frame = self.buf.split_to(pos);
        self.buf.advance(TERMINATOR.len());
        Some(String::from_utf8_lossy(&frame).into_owned())
    }

    /// Drops any retained partial frame. Frames never span connections.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes currently buffered awaiting a terminator.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(decoder: &mut FrameDecoder) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(frame) = decoder.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"{\"op\":\"status\"}\r\n");
        assert_eq!(drain(&mut decoder), vec!["{\"op\":\"status\"}"]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"one\r\ntwo\r\nthree\r\n");
        assert_eq!(drain(&mut decoder), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_partial_frame_is_retained() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"hel");
        assert_eq!(decoder.next_frame(), None);
        assert_eq!(decoder.pending_len(), 3);
        decoder.feed(b"lo\r\n");
        assert_eq!(drain(&mut decoder), vec!["hello"]);
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"alpha\r");
        assert_eq!(decoder.next_frame(), None);
        decoder.feed(b"\nbeta\r\n");
        assert_eq!(drain(&mut decoder), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_chunking_is_irrelevant() {
        // Any re-chunking of the same byte sequence yields the same frames.
        let payload = b"{\"a\":1}\r\n{\"b\":2}\r\n{\"c\":3}\r\n";
        for chunk_size in 1..payload.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = Vec::new();
            for chunk in payload.chunks(chunk_size) {
                decoder.feed(chunk);
                frames.extend(drain(&mut decoder));
            }
            assert_eq!(
                frames,
                vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"],
                "failed at chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn test_chunk_without_terminator_only_grows_buffer() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"abc");
        decoder.feed(b"def");
        assert_eq!(decoder.next_frame(), None);
        assert_eq!(decoder.pending_len(), 6);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"stale-partial");
        decoder.reset();
        decoder.feed(b"fresh\r\n");
        assert_eq!(drain(&mut decoder), vec!["fresh"]);
    }

    #[test]
    fn test_bare_lf_is_not_a_terminator() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"a\nb\r\n");
        assert_eq!(drain(&mut decoder), vec!["a\nb"]);
    }
}
