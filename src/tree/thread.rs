//! Reply threads from `mscan` records: a depth line followed by five field lines.

use log::debug;

use crate::utils::config::RECORD_LINES;
use crate::{MessageNode, MessageStatus};

/// Thread depth of a record's first line.
///
/// `..N...` (two dots, then digits) gives `N`, or 0 if no digit follows. Any other line
/// gives its number of spaces.
pub fn decode_depth(line: &str) -> usize {
    match line.strip_prefix("..") {
        Some(rest) => rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .fold(0usize, |depth, d| {
                depth.saturating_mul(10).saturating_add(usize::from(d - b'0'))
            }),
        None => line.bytes().filter(|&b| b == b' ').count(),
    }
}

/// Incremental builder; feed lines with [`push_line`](Self::push_line), then [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct MessageThreadTreeBuilder {
    roots: Vec<MessageNode>,
    record: Vec<String>,
}

impl MessageThreadTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one line; every complete record is inserted right away.
    pub fn push_line(&mut self, line: String) {
        self.record.push(line);
        if self.record.len() < RECORD_LINES {
            return;
        }
        let mut fields = std::mem::take(&mut self.record).into_iter();
        let depth = fields.next().map_or(0, |l| decode_depth(&l));
        let mut field = || fields.next().unwrap_or_default();
        let id = field();
        let status = MessageStatus::from_line(&field());
        let node = MessageNode {
            id,
            status,
            subject: field(),
            sender: field(),
            date: field(),
            children: Vec::new(),
        };
        self.insert(depth, node);
    }

    /// Descend `depth` levels through the newest node of each level, stopping early at a
    /// childless node, and add `node` there as the newest sibling.
    fn insert(&mut self, mut depth: usize, node: MessageNode) {
        let mut level = &mut self.roots;
        while depth > 0 && !level.is_empty() {
            let head = level.len() - 1;
            level = &mut level[head].children;
            depth -= 1;
        }
        level.push(node);
    }

    /// Drop any incomplete trailing record. Siblings come out in stream order.
    pub fn finish(self) -> Vec<MessageNode> {
        if !self.record.is_empty() {
            debug!(
                "discarding incomplete trailing record ({} of {} lines)",
                self.record.len(),
                RECORD_LINES
            );
        }
        self.roots
    }
}

/// Build a thread tree from complete input in one call.
pub fn build_thread_tree<I, S>(lines: I) -> Vec<MessageNode>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut builder = MessageThreadTreeBuilder::new();
    for line in lines {
        builder.push_line(line.into());
    }
    builder.finish()
}
