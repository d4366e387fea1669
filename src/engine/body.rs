//! Whole-output accumulation for message bodies.

use log::debug;

use crate::pipeline::LineStreamReader;
use crate::utils::config::BODY_READ_CHUNK_SIZE;

/// Accumulates a stream in fixed-size reads until a short read, then delivers it once.
pub struct MessageBodyFetcher<F> {
    id: String,
    body: Vec<u8>,
    on_done: F,
}

impl<F> MessageBodyFetcher<F>
where
    F: FnOnce(String, String) + 'static,
{
    pub fn new(id: &str, on_done: F) -> Self {
        Self {
            id: id.to_string(),
            body: Vec::new(),
            on_done,
        }
    }

    /// Start reading; `on_done(id, body)` runs after the final short read.
    pub fn start(self, reader: LineStreamReader) {
        reader.read_chunk(BODY_READ_CHUNK_SIZE, move |reader, chunk| {
            self.on_chunk(reader, chunk)
        });
    }

    fn on_chunk(mut self, reader: LineStreamReader, chunk: Vec<u8>) {
        let short = chunk.len() < BODY_READ_CHUNK_SIZE;
        self.body.extend_from_slice(&chunk);
        if !short {
            self.start(reader);
            return;
        }
        drop(reader);
        debug!("{}: fetched {} bytes", self.id, self.body.len());
        let body = String::from_utf8_lossy(&self.body).into_owned();
        (self.on_done)(self.id, body);
    }
}
