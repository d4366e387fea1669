//! Asynchronous stream reads: a reader thread performs one blocking read per request and posts
//! the result to the [`EventLoop`]. The reader value is consumed by each read and handed back to
//! the completion handler, so a stream never has more than one read in flight.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use std::io::{BufRead, BufReader, Read};
use std::panic::{self, AssertUnwindSafe};
use std::process::Child;
use std::thread;

use super::mainloop::{Event, EventLoop, LoopHandle, Payload, SourceId};
use super::process::{ProcessPipeline, ProcessSpec, reap_stages};

enum ReadRequest {
    Line,
    Chunk(usize),
}

/// Handle to one asynchronous byte stream (normally the stdout of a [`ProcessPipeline`]).
///
/// Dropping it closes the stream; the reader thread then reaps the pipeline's processes.
/// A pending read does not keep the loop alive: dropping the last [`EventLoop`] drops the
/// reader along with its handler.
pub struct LineStreamReader {
    source: SourceId,
    requests: Sender<ReadRequest>,
    event_loop: LoopHandle,
}

impl LineStreamReader {
    /// Spawn `specs` as a pipeline and read its final stdout.
    pub fn spawn(event_loop: &EventLoop, specs: &[ProcessSpec]) -> Result<Self> {
        let pipeline = ProcessPipeline::spawn(specs)?;
        Ok(Self::from_pipeline(event_loop, pipeline))
    }

    pub fn from_pipeline(event_loop: &EventLoop, pipeline: ProcessPipeline) -> Self {
        let (stdout, children) = pipeline.into_parts();
        Self::start(event_loop, stdout, children)
    }

    /// Read from any blocking reader (no processes to reap).
    pub fn from_reader<R>(event_loop: &EventLoop, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::start(event_loop, reader, Vec::new())
    }

    fn start<R>(event_loop: &EventLoop, reader: R, children: Vec<Child>) -> Self
    where
        R: Read + Send + 'static,
    {
        let source = event_loop.next_source();
        let (requests, request_rx) = unbounded();
        let events = event_loop.sender();
        thread::spawn(move || serve_reads(reader, children, source, request_rx, events));
        Self {
            source,
            requests,
            event_loop: event_loop.downgrade(),
        }
    }

    /// Read one line. `on_line` gets the reader back plus the line without its newline, or
    /// `None` at end-of-stream.
    pub fn read_line<F>(self, on_line: F)
    where
        F: FnOnce(Self, Option<String>) + 'static,
    {
        let Some(event_loop) = self.event_loop.upgrade() else {
            debug!("source {}: event loop gone, closing stream", self.source);
            return;
        };
        let sent = self.requests.send(ReadRequest::Line).is_ok();
        let source = self.source;
        event_loop.expect(
            source,
            Box::new(move |payload| match payload {
                Payload::Line(line) => on_line(self, line),
                _ => {
                    warn!("source {source}: expected a line completion");
                    on_line(self, None)
                }
            }),
        );
        if !sent {
            event_loop.post(source, Payload::Line(None));
        }
    }

    /// Read up to `size` bytes, retrying short reads. A chunk shorter than `size` means
    /// end-of-stream.
    pub fn read_chunk<F>(self, size: usize, on_chunk: F)
    where
        F: FnOnce(Self, Vec<u8>) + 'static,
    {
        let Some(event_loop) = self.event_loop.upgrade() else {
            debug!("source {}: event loop gone, closing stream", self.source);
            return;
        };
        let sent = self.requests.send(ReadRequest::Chunk(size)).is_ok();
        let source = self.source;
        event_loop.expect(
            source,
            Box::new(move |payload| match payload {
                Payload::Chunk(chunk) => on_chunk(self, chunk),
                _ => {
                    warn!("source {source}: expected a chunk completion");
                    on_chunk(self, Vec::new())
                }
            }),
        );
        if !sent {
            event_loop.post(source, Payload::Chunk(Vec::new()));
        }
    }
}

/// Something fed line by line until end-of-stream.
pub trait LineConsumer: 'static {
    fn on_line(&mut self, line: String);
    fn on_end(self);
}

/// Drive `consumer` over every line of `reader`, issuing each read from the previous completion.
pub fn consume_lines<C: LineConsumer>(reader: LineStreamReader, mut consumer: C) {
    reader.read_line(move |reader, line| match line {
        Some(line) => {
            consumer.on_line(line);
            consume_lines(reader, consumer);
        }
        None => {
            drop(reader);
            consumer.on_end();
        }
    });
}

/// Reader thread body: answer requests until the handle is dropped, then close and reap.
fn serve_reads<R: Read>(
    reader: R,
    children: Vec<Child>,
    source: SourceId,
    requests: Receiver<ReadRequest>,
    events: Sender<Event>,
) {
    let mut reader = BufReader::new(reader);
    let mut eof = false;
    while let Ok(request) = requests.recv() {
        let payload = match request {
            ReadRequest::Line => {
                let line = if eof {
                    None
                } else {
                    guarded(source, || next_line(&mut reader)).flatten()
                };
                eof = line.is_none();
                Payload::Line(line)
            }
            ReadRequest::Chunk(size) => {
                let chunk = if eof {
                    Vec::new()
                } else {
                    guarded(source, || next_chunk(&mut reader, size)).unwrap_or_default()
                };
                eof = chunk.len() < size;
                Payload::Chunk(chunk)
            }
        };
        if events.send(Event { source, payload }).is_err() {
            break;
        }
    }
    drop(reader);
    reap_stages(children);
}

/// Run one read. A panic inside the reader is logged and reported as end-of-stream, so the
/// pending handler still gets its completion.
fn guarded<T>(source: SourceId, read: impl FnOnce() -> T) -> Option<T> {
    panic::catch_unwind(AssertUnwindSafe(read))
        .map_err(|_| warn!("source {source}: reader panicked, ending stream"))
        .ok()
}

fn next_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf) {
        Ok(0) => None,
        Ok(_) => {
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
        Err(e) => {
            debug!("read failed, treating as end of stream: {e}");
            None
        }
    }
}

fn next_chunk<R: Read>(reader: &mut R, size: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(size);
    if let Err(e) = reader.by_ref().take(size as u64).read_to_end(&mut buf) {
        debug!("read failed after {} bytes: {e}", buf.len());
    }
    buf
}
