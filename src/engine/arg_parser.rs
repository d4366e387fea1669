use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const CONFIG_DIR: &'static str = ".";
}

/// Mailbox and thread trees over the mblaze tools.
#[derive(Clone, Parser)]
#[command(name = "mbtree")]
#[command(about = "Print the mailbox tree; --mailbox lists threads, --show prints a message.")]
pub struct Cli {
    /// Maildir roots passed to mdirs. Default: mdirs' own default.
    #[arg(value_name = "ROOT")]
    pub roots: Vec<String>,

    /// List the messages of this mailbox as reply threads.
    #[arg(long, short = 'm', value_name = "MAILBOX")]
    pub mailbox: Option<String>,

    /// Print the rendered body of this message.
    #[arg(long, short = 's', value_name = "MESSAGE", conflicts_with = "mailbox")]
    pub show: Option<String>,

    /// Fetch unseen/total counts for every mailbox.
    #[arg(long, short = 'c', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub counts: Option<bool>,

    /// Emit JSON instead of a text tree.
    #[arg(long, short = 'j', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Mark messages missing on disk as virtual and skip their bodies.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub detect_virtual: Option<bool>,

    /// Directory holding `.mbtree.toml`. Default: current directory.
    #[arg(long, value_name = "DIR", default_value = DefaultArgs::CONFIG_DIR)]
    pub config: PathBuf,
}
