//! Pipeline components: process chains, the completion loop, stream readers, spawn rollback.

pub mod error_handler;
pub mod mainloop;
pub mod process;
pub mod reader;

pub use error_handler::{report_failed_query, rollback_stages};
pub use mainloop::{EventLoop, SourceId};
pub use process::{ProcessPipeline, ProcessSpec};
pub use reader::{LineConsumer, LineStreamReader, consume_lines};
