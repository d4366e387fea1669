//! Load `.mbtree.toml` from a directory (CLI only). Lib callers inject config via [`Opts`](crate::Opts).

use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::utils::config::{PackagePaths, ToolCommand};

#[derive(Debug, Default, Deserialize)]
pub struct MbtreeToml {
    #[serde(default)]
    tools: ToolsSection,
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct ToolsSection {
    mdirs: Option<Vec<String>>,
    mlist: Option<Vec<String>>,
    mthread: Option<Vec<String>>,
    mscan: Option<Vec<String>>,
    mshow: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    verbose: Option<bool>,
    detect_virtual: Option<bool>,
    counts: Option<bool>,
    json: Option<bool>,
}

/// Parse config text. Errors are logged and yield `None`.
pub fn parse_mbtree_toml(s: &str) -> Option<MbtreeToml> {
    parse_from(s, PackagePaths::get().config_filename())
}

/// Load `.mbtree.toml` from `dir` if present. Returns None if file missing, unreadable or invalid.
pub fn load_mbtree_toml(dir: &Path) -> Option<MbtreeToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_from(&s, &path.display().to_string())
}

fn parse_from(s: &str, origin: &str) -> Option<MbtreeToml> {
    toml::from_str(s)
        .map_err(|e| log::warn!("{origin}: {e}"))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $opts.$field = v;
        }
    };
}

/// Replace a tool command when the file names a non-empty one.
macro_rules! apply_file_tool {
    ($section:expr, $opts:expr, $tool:ident) => {
        if let Some(ref v) = $section.$tool
            && !v.is_empty()
        {
            $opts.tools.$tool = ToolCommand(v.clone());
        }
    };
}

/// Apply file config to opts (only set fields present in the file). Call before applying env and CLI.
pub fn apply_file_to_opts(file: &MbtreeToml, opts: &mut Opts) {
    let tools = &file.tools;
    apply_file_tool!(tools, opts, mdirs);
    apply_file_tool!(tools, opts, mlist);
    apply_file_tool!(tools, opts, mthread);
    apply_file_tool!(tools, opts, mscan);
    apply_file_tool!(tools, opts, mshow);

    let settings = &file.settings;
    apply_file_opt!(settings, opts, verbose);
    apply_file_opt!(settings, opts, detect_virtual);
    apply_file_opt!(settings, opts, counts);
    apply_file_opt!(settings, opts, json);
}
