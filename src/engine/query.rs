//! Query facade: the asynchronous entry points a presentation layer calls.
//!
//! Every query takes one completion callback and invokes it at most once, from inside
//! [`EventLoop::run`]. If a process fails to spawn, the failure is logged and the callback never
//! runs; callers must tolerate that instead of waiting for a result.

use anyhow::Result;
use log::debug;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use super::body::MessageBodyFetcher;
use super::fanin::{CountSlot, FanInContext};
use crate::pipeline::{
    EventLoop, LineConsumer, LineStreamReader, ProcessSpec, consume_lines, report_failed_query,
};
use crate::tree::{DirectoryTreeBuilder, MessageThreadTreeBuilder, walk, walk_mut};
use crate::utils::config::SCAN_FORMAT;
use crate::{DirectoryNode, MailboxCounts, MessageNode, MessageStatus, Opts};

/// Line consumer for `mdirs`.
struct DirectoryQuery<F> {
    builder: DirectoryTreeBuilder,
    on_done: F,
}

impl<F> LineConsumer for DirectoryQuery<F>
where
    F: FnOnce(Vec<DirectoryNode>) + 'static,
{
    fn on_line(&mut self, line: String) {
        self.builder.push_line(&line);
    }

    fn on_end(self) {
        let tree = self.builder.finish();
        debug!("directory tree: {} top-level node(s)", tree.len());
        (self.on_done)(tree);
    }
}

/// Line consumer counting `mlist` output.
struct CountQuery<F> {
    mailbox: String,
    count: usize,
    on_done: F,
}

impl<F> LineConsumer for CountQuery<F>
where
    F: FnOnce(String, usize) + 'static,
{
    fn on_line(&mut self, _line: String) {
        self.count += 1;
    }

    fn on_end(self) {
        (self.on_done)(self.mailbox, self.count);
    }
}

/// Line consumer for `mlist | mthread -r | mscan`.
struct MessageQuery<F> {
    mailbox: String,
    builder: MessageThreadTreeBuilder,
    detect_virtual: bool,
    on_done: F,
}

impl<F> LineConsumer for MessageQuery<F>
where
    F: FnOnce(String, Vec<MessageNode>) + 'static,
{
    fn on_line(&mut self, line: String) {
        self.builder.push_line(line);
    }

    fn on_end(self) {
        let mut messages = self.builder.finish();
        if self.detect_virtual {
            mark_virtual(&mut messages);
        }
        debug!("{}: {} thread root(s)", self.mailbox, messages.len());
        (self.on_done)(self.mailbox, messages);
    }
}

/// Mark messages whose file does not exist (mthread placeholders) as virtual.
pub fn mark_virtual(messages: &mut [MessageNode]) {
    walk_mut(messages, |m| {
        if !Path::new(&m.id).exists() {
            m.status = MessageStatus::Virtual;
        }
    });
}

/// Entry point for all queries. Cheap to clone; clones share the event loop.
#[derive(Clone)]
pub struct Client {
    event_loop: EventLoop,
    opts: Opts,
}

impl Client {
    pub fn new(event_loop: &EventLoop, opts: Opts) -> Self {
        Self {
            event_loop: event_loop.clone(),
            opts,
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    fn spawn(&self, query: &str, specs: &[ProcessSpec]) -> Option<LineStreamReader> {
        let spawned: Result<LineStreamReader> = LineStreamReader::spawn(&self.event_loop, specs);
        spawned
            .map_err(|e| report_failed_query(query, &e))
            .ok()
    }

    /// List mailboxes (`mdirs -a [filters]`) as a reduced tree.
    pub fn list_directories<F>(&self, filters: &[String], on_done: F)
    where
        F: FnOnce(Vec<DirectoryNode>) + 'static,
    {
        let spec = self.opts.tools.mdirs.spec(["-a"]).args(filters.iter().cloned());
        let Some(reader) = self.spawn("list directories", &[spec]) else {
            return;
        };
        consume_lines(
            reader,
            DirectoryQuery {
                builder: DirectoryTreeBuilder::new(),
                on_done,
            },
        );
    }

    /// Count every message of `mailbox` (`mlist <mailbox>`).
    pub fn count_total<F>(&self, mailbox: &str, on_done: F)
    where
        F: FnOnce(String, usize) + 'static,
    {
        let spec = self.opts.tools.mlist.spec([mailbox]);
        self.count_lines("count total", spec, mailbox, on_done);
    }

    /// Count unseen messages of `mailbox` (`mlist -s <mailbox>`).
    pub fn count_unseen<F>(&self, mailbox: &str, on_done: F)
    where
        F: FnOnce(String, usize) + 'static,
    {
        let spec = self.opts.tools.mlist.spec(["-s", mailbox]);
        self.count_lines("count unseen", spec, mailbox, on_done);
    }

    fn count_lines<F>(&self, query: &str, spec: ProcessSpec, mailbox: &str, on_done: F)
    where
        F: FnOnce(String, usize) + 'static,
    {
        let Some(reader) = self.spawn(query, &[spec]) else {
            return;
        };
        consume_lines(
            reader,
            CountQuery {
                mailbox: mailbox.to_string(),
                count: 0,
                on_done,
            },
        );
    }

    /// List the messages of `mailbox` as reply threads (`mlist | mthread -r | mscan -f ...`).
    pub fn list_messages<F>(&self, mailbox: &str, on_done: F)
    where
        F: FnOnce(String, Vec<MessageNode>) + 'static,
    {
        let tools = &self.opts.tools;
        let specs = [
            tools.mlist.spec([mailbox]),
            tools.mthread.spec(["-r"]),
            tools.mscan.spec(["-f", SCAN_FORMAT]),
        ];
        let Some(reader) = self.spawn("list messages", &specs) else {
            return;
        };
        consume_lines(
            reader,
            MessageQuery {
                mailbox: mailbox.to_string(),
                builder: MessageThreadTreeBuilder::new(),
                detect_virtual: self.opts.detect_virtual,
                on_done,
            },
        );
    }

    /// Fetch the rendered body of message `id` (`mshow <id>`).
    ///
    /// With virtual detection on, a missing message file yields an empty body without
    /// spawning anything.
    pub fn fetch_body<F>(&self, id: &str, on_done: F)
    where
        F: FnOnce(String, String) + 'static,
    {
        if self.opts.detect_virtual && !Path::new(id).exists() {
            debug!("{id}: no such message file, empty body");
            let id = id.to_string();
            self.event_loop.defer(move || on_done(id, String::new()));
            return;
        }
        let spec = self.opts.tools.mshow.spec([id]);
        let Some(reader) = self.spawn("fetch body", &[spec]) else {
            return;
        };
        MessageBodyFetcher::new(id, on_done).start(reader);
    }

    /// Fetch total and unseen counts of `mailbox` concurrently; `on_done` runs once both are in.
    pub fn count_mailbox<F>(&self, mailbox: &str, on_done: F)
    where
        F: FnOnce(MailboxCounts) + 'static,
    {
        let ctx = FanInContext::new(mailbox, on_done);

        let unseen = Rc::clone(&ctx);
        self.count_unseen(mailbox, move |_, n| {
            unseen.complete(CountSlot::Unseen, n);
        });

        ctx.acquire();
        let total = Rc::clone(&ctx);
        self.count_total(mailbox, move |_, n| {
            total.complete(CountSlot::Total, n);
        });
    }

    /// [`count_mailbox`](Self::count_mailbox) for every mailbox node of `roots`.
    pub fn count_tree<F>(&self, roots: &[DirectoryNode], on_counts: F)
    where
        F: FnMut(MailboxCounts) + 'static,
    {
        let on_counts = Rc::new(RefCell::new(on_counts));
        walk(roots, |_, node| {
            let Some(mailbox) = node.mailbox.as_deref() else {
                return;
            };
            let on_counts = Rc::clone(&on_counts);
            self.count_mailbox(mailbox, move |counts| (*on_counts.borrow_mut())(counts));
        });
    }
}
