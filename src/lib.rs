//! mbtree: asynchronous mailbox and reply-thread trees over the mblaze command-line tools

pub mod engine;
pub mod pipeline;
pub mod tree;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{Client, FanInContext};
pub use pipeline::EventLoop;

/// Result alias used by public mbtree API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
