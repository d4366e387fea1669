//! Text rendering of trees for the terminal.

use std::collections::HashMap;
use std::fmt::Write;

use crate::tree::walk;
use crate::utils::Colors;
use crate::{DirectoryNode, MailboxCounts, MessageNode};

const INDENT: &str = "  ";

/// One line per node, indented by depth; mailboxes get `unseen/total` when known.
pub fn render_directories(
    roots: &[DirectoryNode],
    counts: &HashMap<String, MailboxCounts>,
) -> String {
    let mut out = String::new();
    walk(roots, |depth, node| {
        let indent = INDENT.repeat(depth);
        let _ = match node.mailbox.as_deref() {
            None => writeln!(out, "{indent}{}", Colors::group(&node.name)),
            Some(mailbox) => match counts.get(mailbox) {
                Some(c) => writeln!(
                    out,
                    "{indent}{} {}",
                    Colors::mailbox(&node.name),
                    Colors::count(&format!("{}/{}", c.unseen, c.total))
                ),
                None => writeln!(out, "{indent}{}", Colors::mailbox(&node.name)),
            },
        };
    });
    out
}

/// One line per message: status flag, indented subject, sender, date.
pub fn render_messages(roots: &[MessageNode]) -> String {
    let mut out = String::new();
    walk(roots, |depth, m| {
        let _ = writeln!(
            out,
            "{} {}{}  | {} | {}",
            Colors::status(m.status),
            INDENT.repeat(depth),
            m.subject,
            m.sender,
            m.date
        );
    });
    out
}
