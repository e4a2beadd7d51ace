//! Incremental parser for chat-completions SSE streams.
//!
//! Feed it raw network chunks; it buffers until it has a complete
//! `\n\n`-terminated frame, joins the frame's `data:` lines, and extracts the
//! delta text from each chunk payload. `[DONE]` sentinels and frames without
//! delta content (role preludes, finish markers) produce nothing.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Incremental SSE parser yielding delta text fragments.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Feed arbitrary bytes into the parser and drain complete fragments.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        // Normalize CRLF so frame detection works with either line ending.
        self.buffer
            .push_str(&String::from_utf8_lossy(bytes).replace("\r\n", "\n"));
        let mut fragments = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };
            if payload == "[DONE]" {
                continue;
            }

            if let Ok(chunk) = serde_json::from_str::<StreamChunk>(&payload) {
                if let Some(content) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                {
                    if !content.is_empty() {
                        fragments.push(content);
                    }
                }
            }
        }

        fragments
    }

    /// True when no partial frame is pending.
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

/// Join a frame's `data:` lines into one payload. Non-data lines (comments,
/// `event:` fields) are ignored.
fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::SseParser;

    fn frame(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n"
        )
    }

    #[test]
    fn test_parses_complete_frames() {
        let mut parser = SseParser::default();
        let input = format!("{}{}", frame("Hello"), frame(" world"));
        assert_eq!(parser.feed(input.as_bytes()), vec!["Hello", " world"]);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn test_buffers_partial_frames_across_feeds() {
        let mut parser = SseParser::default();
        let full = frame("Hi");
        let (head, tail) = full.split_at(10);

        assert!(parser.feed(head.as_bytes()).is_empty());
        assert!(!parser.is_empty_buffer());
        assert_eq!(parser.feed(tail.as_bytes()), vec!["Hi"]);
    }

    #[test]
    fn test_crlf_frame_boundaries() {
        let mut parser = SseParser::default();
        let input =
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n";
        assert_eq!(parser.feed(input.as_bytes()), vec!["Hi"]);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn test_crlf_split_across_feeds() {
        let mut parser = SseParser::default();
        let full = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\n\r\n";
        // Split in the middle of the frame terminator.
        let (head, tail) = full.split_at(full.len() - 3);

        assert!(parser.feed(head.as_bytes()).is_empty());
        assert_eq!(parser.feed(tail.as_bytes()), vec!["Hi"]);
    }

    #[test]
    fn test_done_sentinel_ignored() {
        let mut parser = SseParser::default();
        let input = format!("{}data: [DONE]\n\n", frame("end"));
        assert_eq!(parser.feed(input.as_bytes()), vec!["end"]);
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn test_role_prelude_and_finish_frames_yield_nothing() {
        let mut parser = SseParser::default();
        let input = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                     data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n";
        assert!(parser.feed(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_multi_line_data_payload_joined() {
        let mut parser = SseParser::default();
        // One frame, payload split across two data: lines.
        let input = "data: {\"choices\":[{\"delta\":\ndata: {\"content\":\"ok\"}}]}\n\n";
        // Joined with \n between the lines, which is still valid JSON here.
        assert_eq!(parser.feed(input.as_bytes()), vec!["ok"]);
    }

    #[test]
    fn test_malformed_payload_skipped() {
        let mut parser = SseParser::default();
        let input = format!("data: not json\n\n{}", frame("after"));
        assert_eq!(parser.feed(input.as_bytes()), vec!["after"]);
    }

    #[test]
    fn test_empty_content_skipped() {
        let mut parser = SseParser::default();
        assert!(parser.feed(frame("").as_bytes()).is_empty());
    }
}
