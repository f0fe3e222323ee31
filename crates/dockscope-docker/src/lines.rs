use std::collections::VecDeque;

use futures::{Stream, StreamExt, stream};

use crate::error::SourceError;
use crate::provider::LineStream;

/// Longest line kept whole; anything longer is split at this size
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Reassembles newline-terminated lines from arbitrary byte chunks
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.append(&rest[..pos], &mut lines);
            lines.push(Self::decode(std::mem::take(&mut self.partial)));
            rest = &rest[pos + 1..];
        }
        self.append(rest, &mut lines);

        lines
    }

    /// Extend the partial line, cutting it whenever it reaches the cap
    fn append(&mut self, mut bytes: &[u8], lines: &mut Vec<String>) {
        while self.partial.len() + bytes.len() > MAX_LINE_BYTES {
            let room = MAX_LINE_BYTES - self.partial.len();
            self.partial.extend_from_slice(&bytes[..room]);
            lines.push(Self::decode(std::mem::take(&mut self.partial)));
            bytes = &bytes[room..];
        }
        self.partial.extend_from_slice(bytes);
    }

    /// Flush the unterminated tail, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        Some(Self::decode(std::mem::take(&mut self.partial)))
    }

    fn decode(mut bytes: Vec<u8>) -> String {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

struct SplitState<S> {
    chunks: std::pin::Pin<Box<S>>,
    buffer: LineBuffer,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a stream of byte chunks into a [`LineStream`].
///
/// A chunk error is passed through once and ends the stream.
pub fn split_lines<S>(chunks: S) -> LineStream
where
    S: Stream<Item = Result<Vec<u8>, SourceError>> + Send + 'static,
{
    let state = SplitState {
        chunks: Box::pin(chunks),
        buffer: LineBuffer::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }
            if state.done {
                return None;
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.buffer.push(&chunk);
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    if let Some(tail) = state.buffer.finish() {
                        state.pending.push_back(tail);
                    }
                }
            }
        }
    })
    .boxed()
}
