//! Public and internal types for the mbtree API and query layer.

use serde::Serialize;

use crate::utils::config::Tools;

/// One node of the mailbox hierarchy.
///
/// A node without a mailbox is a grouping node: it only exists to nest mailboxes that share a
/// path prefix. After reduction a grouping node never has exactly one child.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    /// Absolute mailbox path as emitted by `mdirs`, or `None` for a grouping node.
    pub mailbox: Option<String>,
    /// Display name (one path segment, or several `/`-joined after reduction).
    pub name: String,
    pub children: Vec<DirectoryNode>,
}

impl DirectoryNode {
    pub(crate) fn group(name: &str) -> Self {
        Self {
            mailbox: None,
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub(crate) fn mailbox(path: &str, name: &str) -> Self {
        Self {
            mailbox: Some(path.to_string()),
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.mailbox.is_none()
    }
}

/// Message status flag as printed by `mscan %u`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MessageStatus {
    Seen,
    Flagged,
    Unseen,
    Trashed,
    /// Placeholder for a thread member that is not on disk.
    Virtual,
    Other(char),
}

impl MessageStatus {
    /// Decode the status line. Empty lines count as seen since the seen flag is a blank.
    pub fn from_line(line: &str) -> Self {
        match line.chars().next() {
            None | Some(' ') => Self::Seen,
            Some('*') => Self::Flagged,
            Some('.') => Self::Unseen,
            Some('x') => Self::Trashed,
            Some('v') => Self::Virtual,
            Some(c) => Self::Other(c),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Seen => ' ',
            Self::Flagged => '*',
            Self::Unseen => '.',
            Self::Trashed => 'x',
            Self::Virtual => 'v',
            Self::Other(c) => c,
        }
    }
}

/// One message of a reply thread. Children are replies, in stream order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageNode {
    /// Message identifier; for mblaze this is the message file path.
    pub id: String,
    pub status: MessageStatus,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub children: Vec<MessageNode>,
}

/// Total and unseen message counts of one mailbox, filled by two independent queries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MailboxCounts {
    pub mailbox: String,
    pub total: usize,
    pub unseen: usize,
}

/// Full options (CLI and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Command prefixes for the external tools.
    pub tools: Tools,
    /// Mark messages whose file is missing as [`MessageStatus::Virtual`] and skip body fetches for them.
    pub detect_virtual: bool,
    /// Fetch unseen/total counts for every mailbox (CLI).
    pub counts: bool,
    /// Print JSON instead of the text tree (CLI).
    pub json: bool,
    /// Debug logging (CLI).
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            tools: Tools::default(),
            detect_virtual: true,
            counts: false,
            json: false,
            verbose: false,
        }
    }
}
