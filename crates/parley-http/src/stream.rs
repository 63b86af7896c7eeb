// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text reply streams.
//!
//! The hosted chat endpoints stream raw UTF-8 text. Network chunks may split
//! a multi-byte character, so undecodable tails are carried into the next
//! chunk. The finish reason arrives in a response header and is emitted with
//! the final chunk.

use std::error::Error as StdError;

use futures::stream::{self, Stream, StreamExt};
use parley_core::ParleyError;
use parley_core::traits::ChatStream;
use parley_core::types::StreamChunk;

/// Response header carrying the finish reason of a streamed reply.
pub const FINISH_REASON_HEADER: &str = "x-finish-reason";

const DEFAULT_FINISH_REASON: &str = "stop";

/// Converts a streaming HTTP response into a [`ChatStream`].
pub fn text_stream(response: reqwest::Response) -> ChatStream {
    let finish_reason = response
        .headers()
        .get(FINISH_REASON_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_FINISH_REASON)
        .to_string();
    decode_stream(response.bytes_stream(), finish_reason)
}

/// Decodes a byte stream into text chunks, ending with `finish_reason`.
pub fn decode_stream<S, B, E>(bytes: S, finish_reason: String) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    let state = Some((Box::pin(bytes), Vec::new(), finish_reason));
    Box::pin(stream::unfold(state, |state| async move {
        let (mut bytes, mut pending, finish_reason) = state?;
        loop {
            match bytes.next().await {
                Some(Ok(chunk)) => {
                    pending.extend_from_slice(chunk.as_ref());
                    let text = take_complete_utf8(&mut pending);
                    if !text.is_empty() {
                        let item = StreamChunk {
                            text: Some(text),
                            finish_reason: None,
                        };
                        return Some((Ok(item), Some((bytes, pending, finish_reason))));
                    }
                }
                Some(Err(e)) => {
                    let err = ParleyError::Transport {
                        message: format!("reply stream interrupted: {e}"),
                        source: Some(Box::new(e)),
                    };
                    return Some((Err(err), None));
                }
                None => {
                    let tail = String::from_utf8_lossy(&pending).into_owned();
                    let item = StreamChunk {
                        text: (!tail.is_empty()).then_some(tail),
                        finish_reason: Some(finish_reason),
                    };
                    return Some((Ok(item), None));
                }
            }
        }
    }))
}

/// Drains the longest decodable prefix of `pending`.
///
/// Invalid sequences become U+FFFD; an incomplete trailing sequence stays in
/// `pending`.
pub(crate) fn take_complete_utf8(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(text) => {
                out.push_str(text);
                pending.clear();
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + len);
                    }
                    None => {
                        pending.drain(..valid);
                        return out;
                    }
                }
            }
        }
    }
}
