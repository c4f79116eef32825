//! Decoder for upstream `OpenAI` server-sent-event streams
//!
//! The decoder is line oriented: each `data:` line carries one JSON chunk and
//! `data: [DONE]` ends the stream. Other SSE fields and comments are skipped.

use futures_util::{Stream, stream};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::LlmError;
use crate::protocol::openai::OpenAiStreamChunk;
use crate::types::ChatChunk;

/// Field prefix of lines that carry a payload
pub const STREAM_PREFIX: &str = "data:";

/// Payload that ends the stream
pub const STREAM_END_TOKEN: &str = "[DONE]";

enum Line<'a> {
    Data(&'a str),
    End,
    Skip,
}

fn classify(line: &str) -> Line<'_> {
    let Some(payload) = line.strip_prefix(STREAM_PREFIX) else {
        return Line::Skip;
    };

    match payload.trim() {
        STREAM_END_TOKEN => Line::End,
        data => Line::Data(data),
    }
}

/// Decode an SSE body into canonical chunks
///
/// The returned stream owns `reader` and drops it as soon as the stream
/// ends, fails, or is itself dropped. A malformed chunk or a read error is
/// reported once and then the stream ends.
pub fn decode_chunks<R>(reader: R) -> impl Stream<Item = Result<ChatChunk, LlmError>> + Send
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader.lines()), |state| async move {
        let mut lines = state?;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read upstream stream");
                    return Some((Err(LlmError::Streaming(format!("failed to read upstream stream: {e}"))), None));
                }
            };

            match classify(&line) {
                Line::Skip => {}
                Line::End => return None,
                Line::Data(data) => {
                    return match serde_json::from_str::<OpenAiStreamChunk>(data) {
                        Ok(chunk) => Some((Ok(chunk.into()), Some(lines))),
                        Err(e) => {
                            tracing::warn!(error = %e, data = %data, "malformed upstream chunk");
                            Some((Err(LlmError::Streaming(format!("malformed upstream chunk: {e}"))), None))
                        }
                    };
                }
            }
        }
    })
}
