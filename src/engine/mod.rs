//! Engine module: queries, fan-in, body fetch and the CLI around them

pub mod arg_parser;
pub mod body;
pub mod fanin;
pub mod handlers;
pub mod query;
pub mod render;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use body::MessageBodyFetcher;
pub use fanin::{CountSlot, FanInContext};
pub use handlers::{handle_run, setup_opts};
pub use query::{Client, mark_virtual};
pub use render::{render_directories, render_messages};
