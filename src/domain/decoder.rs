//! Streaming layout decoder
//!
//! Folds an arbitrarily fragmented byte stream into button records. The
//! peripheral frames its response as `[numButtons:u8]` followed by
//! `numButtons` fixed-size records, but notifications may split that stream
//! anywhere; the decoder buffers every delivery and only consumes whole
//! records, leaving a partial trailing record for the next delivery.

use crate::domain::layout::Button;
use crate::domain::protocol::{parse_button_record, BUTTON_RECORD_LEN};
use thiserror::Error;
use tracing::trace;

/// Events produced while folding the layout stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// One whole button record was consumed
    RecordDecoded(Button),
    /// All declared records have been decoded; emitted exactly once
    LayoutComplete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The decoder already emitted `LayoutComplete`; the session must
    /// allocate a fresh decoder per layout request.
    #[error("decoder fed after layout completed")]
    AlreadyComplete,
}

/// Per-session parser state. One instance decodes exactly one layout.
#[derive(Debug, Default)]
pub struct LayoutDecoder {
    buffer: Vec<u8>,
    /// Consume offset into `buffer`
    index: usize,
    /// Declared record count, unset until the first byte arrives
    remaining: Option<u8>,
    complete: bool,
}

impl LayoutDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Fold one data delivery into the stream. Returns every event the
    /// delivery produced, possibly none; never blocks.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError> {
        if self.complete {
            return Err(DecodeError::AlreadyComplete);
        }

        self.buffer.extend_from_slice(data);
        trace!(
            delivered = data.len(),
            buffered = self.buffer.len() - self.index,
            "Layout data received"
        );

        let mut events = Vec::new();

        if self.remaining.is_none() {
            if self.buffer.len() - self.index == 0 {
                return Ok(events);
            }
            self.remaining = Some(self.buffer[self.index]);
            self.index += 1;
        }

        while self.remaining.unwrap_or(0) > 0
            && self.buffer.len() - self.index >= BUTTON_RECORD_LEN
        {
            let record = &self.buffer[self.index..self.index + BUTTON_RECORD_LEN];
            events.push(DecodeEvent::RecordDecoded(parse_button_record(record)));
            self.index += BUTTON_RECORD_LEN;
            self.remaining = Some(self.remaining.unwrap_or(0) - 1);
        }

        if self.remaining == Some(0) {
            self.complete = true;
            events.push(DecodeEvent::LayoutComplete);
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::protocol::encode_button_record;

    fn button(id: u8) -> Button {
        Button {
            id,
            x: id,
            y: 2 * id,
            width: 60,
            height: 40,
            border: id % 2 == 0,
            label: format!("btn-{id}"),
            image: None,
            active: false,
        }
    }

    fn stream(buttons: &[Button]) -> Vec<u8> {
        let mut bytes = vec![buttons.len() as u8];
        for b in buttons {
            bytes.extend_from_slice(&encode_button_record(b));
        }
        bytes
    }

    fn decode_chunked(bytes: &[u8], chunk_len: usize) -> Vec<DecodeEvent> {
        let mut decoder = LayoutDecoder::new();
        let mut events = Vec::new();
        for chunk in bytes.chunks(chunk_len) {
            events.extend(decoder.feed(chunk).unwrap());
        }
        events
    }

    fn assert_stream_decodes(events: &[DecodeEvent], buttons: &[Button]) {
        assert_eq!(events.len(), buttons.len() + 1);
        for (event, expected) in events.iter().zip(buttons) {
            match event {
                DecodeEvent::RecordDecoded(b) => assert_eq!(b, expected),
                other => panic!("expected record, got {other:?}"),
            }
        }
        assert_eq!(events.last(), Some(&DecodeEvent::LayoutComplete));
    }

    #[test]
    fn test_whole_stream_at_once() {
        let buttons = vec![button(1), button(2), button(3)];
        let events = decode_chunked(&stream(&buttons), usize::MAX);
        assert_stream_decodes(&events, &buttons);
    }

    #[test]
    fn test_chunking_is_invisible() {
        let buttons = vec![button(1), button(2), button(3)];
        let bytes = stream(&buttons);
        let reference = decode_chunked(&bytes, usize::MAX);

        // Fragment sizes straddling every interesting boundary: single
        // bytes, sub-record, the server's 64-byte writes, over-record.
        for chunk_len in [1, 7, 64, BUTTON_RECORD_LEN, BUTTON_RECORD_LEN + 1, 400] {
            let events = decode_chunked(&bytes, chunk_len);
            assert_eq!(events, reference, "chunk_len = {chunk_len}");
        }
    }

    #[test]
    fn test_zero_buttons_completes_immediately() {
        let mut decoder = LayoutDecoder::new();
        let events = decoder.feed(&[0x00]).unwrap();
        assert_eq!(events, vec![DecodeEvent::LayoutComplete]);
        assert!(decoder.is_complete());
    }

    #[test]
    fn test_empty_delivery_is_a_no_op() {
        let buttons = vec![button(9)];
        let bytes = stream(&buttons);
        let (head, tail) = bytes.split_at(100);

        let mut decoder = LayoutDecoder::new();
        let mut events = decoder.feed(head).unwrap();
        events.extend(decoder.feed(&[]).unwrap());
        events.extend(decoder.feed(tail).unwrap());

        assert_stream_decodes(&events, &buttons);
    }

    #[test]
    fn test_empty_first_delivery() {
        let mut decoder = LayoutDecoder::new();
        assert_eq!(decoder.feed(&[]).unwrap(), vec![]);
        let events = decoder.feed(&[0x00]).unwrap();
        assert_eq!(events, vec![DecodeEvent::LayoutComplete]);
    }

    #[test]
    fn test_partial_record_stays_buffered() {
        let buttons = vec![button(5)];
        let bytes = stream(&buttons);

        let mut decoder = LayoutDecoder::new();
        // Count byte plus most of the record: no events yet
        let events = decoder.feed(&bytes[..BUTTON_RECORD_LEN]).unwrap();
        assert!(events.is_empty());
        assert!(!decoder.is_complete());

        let events = decoder.feed(&bytes[BUTTON_RECORD_LEN..]).unwrap();
        assert_stream_decodes(&events, &buttons);
    }

    #[test]
    fn test_feed_after_complete_is_an_error() {
        let mut decoder = LayoutDecoder::new();
        decoder.feed(&[0x00]).unwrap();
        assert_eq!(decoder.feed(&[0x01]), Err(DecodeError::AlreadyComplete));
    }

    #[test]
    fn test_max_count_header() {
        let mut decoder = LayoutDecoder::new();
        let events = decoder.feed(&[0xFF]).unwrap();
        assert!(events.is_empty());
        assert!(!decoder.is_complete());
    }
}
