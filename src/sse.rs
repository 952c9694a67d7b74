//! Incremental parsers for SSE (Server-Sent Events) byte input.
//!
//! [`SseStream`] adapts an async byte stream and [`SseReader`] adapts a
//! blocking [`std::io::Read`]; both share the same buffering and event
//! parsing so split chunks, multi-line data, and streams that end without
//! a trailing blank line behave identically.

use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

/// Events are separated by a blank line.
const SEPARATOR: &[u8] = b"\n\n";

/// Cap on buffered bytes between event separators.
const MAX_BUFFER_SIZE: usize = 1_000_000;

/// Read size for the blocking adapter.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A Server-Sent Events (SSE) event.
///
/// The completions endpoint only ever populates `data:` lines, so that is
/// all we keep; `event:`, `id:`, and `retry:` fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event data, with multi-line payloads joined by `\n`.
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Check if this is the sentinel event that signals end of stream.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Parse a single complete SSE event from its text representation.
///
/// Returns `None` when the block carries no data lines (comments and
/// keep-alive blank lines).
fn parse_event(event_text: &str) -> Option<SseEvent> {
    let mut data_lines = Vec::new();

    for line in event_text.lines() {
        let line = line.trim_end();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        if let Some((field, mut value)) = line.split_once(':') {
            // Remove optional leading space after colon
            if value.starts_with(' ') {
                value = &value[1..];
            }

            if field == "data" {
                data_lines.push(value.to_string());
            }
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        data: data_lines.join("\n"),
    })
}

/// Parse complete events out of `buffer`, pushing them onto `events` and
/// draining the consumed bytes. Bytes after the last separator stay in the
/// buffer until more input arrives.
fn drain_events(buffer: &mut Vec<u8>, events: &mut VecDeque<SseEvent>) -> Result<(), Error> {
    let finder = memmem::Finder::new(SEPARATOR);
    let mut start = 0;

    while let Some(pos) = finder.find(&buffer[start..]) {
        let event_end = start + pos;
        let event_text = std::str::from_utf8(&buffer[start..event_end])
            .map_err(|e| Error::streaming(format!("invalid UTF-8 in SSE event: {e}")))?;

        if let Some(event) = parse_event(event_text) {
            events.push_back(event);
        }

        start = event_end + SEPARATOR.len();
    }

    if start > 0 {
        buffer.drain(..start);
    }

    Ok(())
}

/// Interpret whatever remains in the buffer as a final event. Some servers
/// end the stream right after the last `data:` line without the closing
/// blank line. Invalid UTF-8 in the tail is reported just like it is
/// mid-stream.
fn drain_tail(buffer: &mut Vec<u8>) -> Result<Option<SseEvent>, Error> {
    if buffer.is_empty() {
        return Ok(None);
    }
    let event = std::str::from_utf8(buffer)
        .map(parse_event)
        .map_err(|e| Error::streaming(format!("invalid UTF-8 in SSE event: {e}")));
    buffer.clear();
    event
}

/// A stream adapter that parses SSE events from an async byte stream.
/// Maintains internal state to handle events split across chunks.
pub struct SseStream<S> {
    inner: S,
    /// Incomplete raw bytes from previous chunks
    buffer: Vec<u8>,
    /// Parsed events ready to be yielded
    events: VecDeque<SseEvent>,
    done: bool,
}

impl<S> SseStream<S> {
    /// Create a new SSE stream from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            events: VecDeque::new(),
            done: false,
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            // Terminal states first: after end or error the stream is fused.
            if this.done {
                return Poll::Ready(None);
            }

            // Yield any already-parsed events in FIFO order
            if let Some(event) = this.events.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match ready!(this.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    this.buffer.extend_from_slice(&chunk);

                    if this.buffer.len() > MAX_BUFFER_SIZE {
                        this.buffer.clear();
                        this.done = true;
                        return Poll::Ready(Some(Err(Error::streaming(
                            "SSE buffer exceeded maximum size",
                        ))));
                    }

                    if let Err(error) = drain_events(&mut this.buffer, &mut this.events) {
                        this.done = true;
                        return Poll::Ready(Some(Err(error)));
                    }
                }
                Some(Err(error)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "transport error mid-stream: {}",
                        error.into()
                    )))));
                }
                None => {
                    this.done = true;
                    return Poll::Ready(match drain_tail(&mut this.buffer) {
                        Ok(event) => event.map(Ok),
                        Err(error) => Some(Err(error)),
                    });
                }
            }
        }
    }
}

/// An iterator that parses SSE events from a blocking reader, the
/// synchronous counterpart of [`SseStream`].
pub struct SseReader<R> {
    inner: R,
    buffer: Vec<u8>,
    events: VecDeque<SseEvent>,
    done: bool,
}

impl<R> SseReader<R> {
    /// Create a new SSE reader over a blocking byte source.
    pub fn new(reader: R) -> Self {
        Self {
            inner: reader,
            buffer: Vec::new(),
            events: VecDeque::new(),
            done: false,
        }
    }
}

impl<R: Read> Iterator for SseReader<R> {
    type Item = Result<SseEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if self.done {
                return None;
            }

            if let Some(event) = self.events.pop_front() {
                return Some(Ok(event));
            }

            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return match drain_tail(&mut self.buffer) {
                        Ok(event) => event.map(Ok),
                        Err(error) => Some(Err(error)),
                    };
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);

                    if self.buffer.len() > MAX_BUFFER_SIZE {
                        self.buffer.clear();
                        self.done = true;
                        return Some(Err(Error::streaming(
                            "SSE buffer exceeded maximum size",
                        )));
                    }

                    if let Err(error) = drain_events(&mut self.buffer, &mut self.events) {
                        self.done = true;
                        return Some(Err(error));
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.done = true;
                    return Some(Err(Error::streaming(format!(
                        "transport error mid-stream: {error}"
                    ))));
                }
            }
        }
    }
}
