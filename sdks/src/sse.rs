// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde_json::Value;

/// Incremental decoder for `text/event-stream` bodies.
///
/// Events are complete once terminated by a blank line; an unterminated
/// trailing event is discarded. `data:` payloads that are not JSON are
/// returned as JSON strings.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_event(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

/// Decode a complete event stream body.
pub fn decode_all(body: &[u8]) -> Vec<Value> {
    SseDecoder::new().push(body)
}

fn parse_event(block: &str) -> Option<Value> {
    let data: Vec<&str> = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|d| d.strip_prefix(' ').unwrap_or(d))
        .collect();
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    Some(serde_json::from_str(&data).unwrap_or(Value::String(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_events() {
        let events = decode_all(b"data: {\"a\":1}\n\ndata: \"hello\"\n\n");
        assert_eq!(events, vec![json!({"a": 1}), json!("hello")]);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"st").is_empty());
        assert!(decoder.push(b"ep\":1}\n").is_empty());
        assert_eq!(decoder.push(b"\ndata: 2\n\n"), vec![json!({"step": 1}), json!(2)]);
    }

    #[test]
    fn test_comments_crlf_and_plain_text() {
        let events = decode_all(b": keep-alive\r\n\r\ndata: not json\r\n\r\n");
        assert_eq!(events, vec![json!("not json")]);
    }

    #[test]
    fn test_unterminated_event_dropped() {
        assert!(decode_all(b"data: 1\n").is_empty());
    }
}
