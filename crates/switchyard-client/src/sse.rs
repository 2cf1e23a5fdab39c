//! Server-sent event parsing for the update stream

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use switchyard_core::UpdateEvent;

use crate::error::{ClientError, Result};

/// Parse a byte stream of SSE frames into typed update events
///
/// Frames are separated by a blank line. Bytes are buffered until a frame
/// is complete, so multi-byte characters may straddle chunk boundaries.
/// Comment frames (keep-alives) are skipped; payloads that do not match a
/// known event are surfaced as [`ClientError::Parse`] without ending the
/// stream.
pub fn parse_update_stream<S, E>(byte_stream: S) -> impl Stream<Item = Result<UpdateEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError>,
{
    let frame_stream = byte_stream
        .map(|result| result.map_err(Into::into))
        .scan(Vec::<u8>::new(), |buffer, result| {
            let bytes = match result {
                Ok(b) => b,
                Err(e) => return std::future::ready(Some(vec![Err(e)])),
            };

            buffer.extend_from_slice(&bytes);
            strip_carriage_returns(buffer);

            let mut frames = Vec::new();
            while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
                let frame: Vec<u8> = buffer.drain(..pos + 2).collect();
                if let Some(data) = frame_data(&frame[..pos]).transpose() {
                    frames.push(data);
                }
            }

            std::future::ready(Some(frames))
        })
        .flat_map(stream::iter);

    frame_stream.map(|result| {
        result.and_then(|data| {
            serde_json::from_str::<UpdateEvent>(&data)
                .map_err(|e| ClientError::Parse(format!("invalid update event: {e}")))
        })
    })
}

/// Turn `\r\n` line endings into `\n`
///
/// A trailing `\r` is kept until the next chunk shows what follows it.
fn strip_carriage_returns(buffer: &mut Vec<u8>) {
    if !buffer.contains(&b'\r') {
        return;
    }

    let mut normalized = Vec::with_capacity(buffer.len());
    let mut bytes = buffer.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&b'\n') {
            continue;
        }
        normalized.push(byte);
    }
    *buffer = normalized;
}

/// Joined `data:` lines of one complete frame, if it has any
fn frame_data(frame: &[u8]) -> Result<Option<String>> {
    let frame =
        std::str::from_utf8(frame).map_err(|e| ClientError::Parse(format!("update frame is not UTF-8: {e}")))?;

    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    Ok((!data.is_empty()).then(|| data.join("\n")))
}
