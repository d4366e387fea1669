//! Application configuration constants.
//! Tool commands, record layout and read sizes in one place.

use std::sync::OnceLock;

use crate::pipeline::ProcessSpec;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable overriding one tool, e.g. `MBTREE_MSCAN`.
    pub fn tool_env_var(&self, tool: &str) -> String {
        format!("{}_{}", self.env_prefix, tool.to_uppercase())
    }
}

// ---- Message records ----

/// Lines per `mscan` record: depth, id, status, subject, sender, date.
pub const RECORD_LINES: usize = 6;

/// `mscan` format producing one [`RECORD_LINES`]-line record per message.
pub const SCAN_FORMAT: &str = "%i\n%R\n%u\n%s\n%f\n%D";

// ---- Body fetch ----

/// Size of each read while accumulating a message body (bytes).
pub const BODY_READ_CHUNK_SIZE: usize = 1024;

// ---- External tools ----

/// A configured tool: program plus leading arguments, before any query-specific arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand(pub Vec<String>);

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        Self(vec![program.to_string()])
    }

    /// Parse a whitespace-separated command prefix (environment overrides). Empty input yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let words: Vec<String> = s.split_whitespace().map(str::to_string).collect();
        (!words.is_empty()).then_some(Self(words))
    }

    /// Build a process spec from this prefix plus `args`.
    pub fn spec<I, S>(&self, args: I) -> ProcessSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (program, prefix) = match self.0.split_first() {
            Some((program, prefix)) => (program.as_str(), prefix),
            None => ("", &[][..]),
        };
        ProcessSpec::new(program)
            .args(prefix.iter().cloned())
            .args(args)
    }
}

/// Commands for the five external tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tools {
    /// Lists mailbox paths, one per line.
    pub mdirs: ToolCommand,
    /// Lists message paths of a mailbox (`-s`: unseen only).
    pub mlist: ToolCommand,
    /// Reorders message paths by thread.
    pub mthread: ToolCommand,
    /// Formats message fields.
    pub mscan: ToolCommand,
    /// Renders a message body.
    pub mshow: ToolCommand,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            mdirs: ToolCommand::new("mdirs"),
            mlist: ToolCommand::new("mlist"),
            mthread: ToolCommand::new("mthread"),
            mscan: ToolCommand::new("mscan"),
            mshow: ToolCommand::new("mshow"),
        }
    }
}

impl Tools {
    /// Apply `MBTREE_<TOOL>` environment overrides (after `.env` has been loaded by the caller).
    pub fn apply_env(&mut self) {
        let paths = PackagePaths::get();
        for (name, tool) in [
            ("mdirs", &mut self.mdirs),
            ("mlist", &mut self.mlist),
            ("mthread", &mut self.mthread),
            ("mscan", &mut self.mscan),
            ("mshow", &mut self.mshow),
        ] {
            if let Some(cmd) = std::env::var(paths.tool_env_var(name))
                .ok()
                .and_then(|v| ToolCommand::parse(&v))
            {
                log::debug!("{name} overridden from environment: {:?}", cmd.0);
                *tool = cmd;
            }
        }
    }
}
