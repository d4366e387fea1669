//! mbtree CLI: print the mailbox tree, a mailbox's threads (--mailbox) or a message (--show).

use anyhow::Result;
use clap::Parser;
use mbtree::engine::arg_parser::Cli;
use mbtree::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
