//! Mailbox hierarchy from `mdirs` output: one absolute path per line.

use log::debug;

use crate::DirectoryNode;

/// Incremental builder; feed lines with [`push_line`](Self::push_line), then [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct DirectoryTreeBuilder {
    roots: Vec<DirectoryNode>,
}

impl DirectoryTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one mailbox path such as `/home/me/mail/INBOX`.
    ///
    /// Intermediate segments reuse the newest sibling of the same name (mailbox or not) or
    /// create a grouping node. The last segment always becomes a new mailbox node whose
    /// identifier is the whole line. Lines not starting with `/` are ignored.
    pub fn push_line(&mut self, line: &str) {
        let Some(mut rest) = line.strip_prefix('/') else {
            debug!("ignoring relative mailbox path {line:?}");
            return;
        };
        let mut level = &mut self.roots;
        while let Some((segment, tail)) = rest.split_once('/') {
            let idx = match level.iter().rposition(|n| n.name == segment) {
                Some(idx) => idx,
                None => {
                    level.push(DirectoryNode::group(segment));
                    level.len() - 1
                }
            };
            level = &mut level[idx].children;
            rest = tail;
        }
        level.push(DirectoryNode::mailbox(line, rest));
    }

    /// Put back the root `/` on top-level names and collapse singleton grouping chains.
    /// Siblings come out in input order.
    pub fn finish(mut self) -> Vec<DirectoryNode> {
        for node in &mut self.roots {
            node.name.insert(0, '/');
        }
        reduce(&mut self.roots);
        self.roots
    }
}

/// Collapse every chain of grouping nodes with a single child into one node named by the
/// `/`-joined segments. Idempotent.
pub fn reduce(nodes: &mut [DirectoryNode]) {
    let mut stack: Vec<&mut DirectoryNode> = nodes.iter_mut().collect();
    while let Some(node) = stack.pop() {
        while node.mailbox.is_none() && node.children.len() == 1 {
            let Some(mut child) = node.children.pop() else {
                break;
            };
            node.name.push('/');
            node.name.push_str(&child.name);
            node.mailbox = child.mailbox.take();
            node.children = std::mem::take(&mut child.children);
        }
        stack.extend(node.children.iter_mut());
    }
}

/// Build a reduced tree from complete input in one call.
pub fn build_directory_tree<'a, I>(lines: I) -> Vec<DirectoryNode>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut builder = DirectoryTreeBuilder::new();
    for line in lines {
        builder.push_line(line);
    }
    builder.finish()
}
