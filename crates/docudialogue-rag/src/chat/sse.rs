//! Incremental server-sent-events parsing

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};

use crate::error::{Error, Result};

/// Turn a streaming HTTP response into its SSE `data:` payloads.
///
/// Frames are reassembled across network chunk boundaries, so a payload
/// split mid-line arrives intact. Transport failures mid-stream surface as
/// [`Error::Transport`].
pub(crate) fn data_events(
    response: reqwest::Response,
    provider: &'static str,
) -> impl Stream<Item = Result<String>> {
    try_stream! {
        let mut bytes = response.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk
                .map_err(|e| Error::transport(format!("{provider} stream interrupted: {e}")))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                let line = line.trim();
                if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim();
                    if !data.is_empty() {
                        yield data.to_string();
                    }
                }
            }
        }
    }
}
