//! Server-Sent Events (SSE) parser for Gemini responses

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::GenerateContentResponse;

/// Parse a stream of bytes as Gemini SSE events
///
/// Gemini emits one `data: <json>` line per chunk. Lines may be split across network
/// reads, so bytes are buffered until a newline arrives; `event:`/`id:` lines and
/// blank separators are ignored.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, LlmError>> + Send>> {
    // Raw bytes, so multi-byte UTF-8 sequences split across chunks survive
    let mut buffer: Vec<u8> = Vec::new();

    let event_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    events.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(event) = parse_data_line(line) {
                events.push(event);
            }
        }

        futures::stream::iter(events)
    });

    Box::pin(event_stream)
}

/// Decode a single SSE line; `None` for lines that carry no payload
fn parse_data_line(line: &str) -> Option<Result<GenerateContentResponse, LlmError>> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
            LlmError::SerializationError(format!("Failed to parse SSE data: {}. Data: {}", e, data))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gemini::types::Part;
    use futures::stream;

    fn bytes_stream(
        chunks: Vec<&'static [u8]>,
    ) -> Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>> {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ))
    }

    #[tokio::test]
    async fn test_parse_chunked_data() {
        let mut sse = parse_sse_stream(bytes_stream(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"mo",
            b"del\",\"parts\":[{\"text\":\"CPU at 12%\"}]}}]}\n",
        ]));

        let response = sse.next().await.unwrap().unwrap();
        match &response.candidates[0].content.parts[0] {
            Part::Text { text } => assert_eq!(text, "CPU at 12%"),
            other => panic!("Expected text part, got {other:?}"),
        }
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        // "°" is 0xC2 0xB0; split it between reads
        let mut sse = parse_sse_stream(bytes_stream(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"45\xC2",
            b"\xB0C\"}]}}]}\r\n",
        ]));

        let response = sse.next().await.unwrap().unwrap();
        match &response.candidates[0].content.parts[0] {
            Part::Text { text } => assert_eq!(text, "45°C"),
            other => panic!("Expected text part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ignores_non_data_lines() {
        let mut sse = parse_sse_stream(bytes_stream(vec![
            b"event: message\nid: 7\n\ndata:{\"candidates\":[]}\n",
        ]));

        let response = sse.next().await.unwrap().unwrap();
        assert!(response.candidates.is_empty());
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_parse_invalid_json() {
        let mut sse = parse_sse_stream(bytes_stream(vec![b"data: {invalid json}\n"]));
        let err = sse.next().await.unwrap().unwrap_err();
        assert!(matches!(err, LlmError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_parse_function_call() {
        let mut sse = parse_sse_stream(bytes_stream(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"functionCall\":{\"name\":\"live_system_info\",\"args\":{\"command_or_request\":\"disk\"}}}]}}]}\n",
        ]));

        let response = sse.next().await.unwrap().unwrap();
        match &response.candidates[0].content.parts[0] {
            Part::FunctionCall { function_call } => {
                assert_eq!(function_call.name, "live_system_info");
                assert_eq!(function_call.args["command_or_request"], "disk");
            }
            other => panic!("Expected function call part, got {other:?}"),
        }
    }
}
