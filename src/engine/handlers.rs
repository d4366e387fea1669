//! CLI command handler: directory tree by default, threads with --mailbox, body with --show.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::arg_parser::Cli;
use crate::engine::query::Client;
use crate::engine::render::{render_directories, render_messages};
use crate::pipeline::EventLoop;
use crate::utils::{apply_file_to_opts, load_mbtree_toml, setup_logging};
use crate::{DirectoryNode, MailboxCounts, Opts};

/// Rendered output, filled from inside a completion callback.
type Output = Rc<RefCell<Option<Result<String>>>>;

/// Defaults, then `.mbtree.toml`, then environment, then CLI flags.
pub fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let file = load_mbtree_toml(&cli.config);
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    setup_logging(cli.verbose.unwrap_or(opts.verbose));
    let _ = dotenvy::dotenv();
    opts.tools.apply_env();
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(v) = cli.counts {
        opts.counts = v;
    }
    if let Some(v) = cli.json {
        opts.json = v;
    }
    if let Some(v) = cli.detect_virtual {
        opts.detect_virtual = v;
    }
    opts
}

/// Run the selected query to completion and print its result.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    debug!("{} CONFIG: {:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);
    let event_loop = EventLoop::new();
    let client = Client::new(&event_loop, opts);

    let output: Output = Rc::new(RefCell::new(None));
    if let Some(id) = cli.show.as_deref() {
        show_message(&client, id, &output);
        event_loop.run();
    } else if let Some(mailbox) = cli.mailbox.as_deref() {
        list_messages(&client, mailbox, &output);
        event_loop.run();
    } else {
        list_directories(&client, &cli.roots, &output);
    }

    let output = output
        .borrow_mut()
        .take()
        .ok_or_else(|| anyhow!("query produced no result (see warnings above)"))??;
    print!("{output}");
    Ok(())
}

fn show_message(client: &Client, id: &str, output: &Output) {
    let output = Rc::clone(output);
    client.fetch_body(id, move |_, body| {
        *output.borrow_mut() = Some(Ok(body));
    });
}

fn list_messages(client: &Client, mailbox: &str, output: &Output) {
    let output = Rc::clone(output);
    let json = client.opts().json;
    client.list_messages(mailbox, move |_, messages| {
        let rendered = if json {
            serde_json::to_string_pretty(&messages)
                .map(|s| s + "\n")
                .context("serialize messages")
        } else {
            Ok(render_messages(&messages))
        };
        *output.borrow_mut() = Some(rendered);
    });
}

/// With counts on, the fan-in queries are issued from the listing callback and the tree is
/// rendered after the loop drains, once every count has arrived.
fn list_directories(client: &Client, roots: &[String], output: &Output) {
    let tree: Rc<RefCell<Option<Vec<DirectoryNode>>>> = Rc::new(RefCell::new(None));
    let counts: Rc<RefCell<HashMap<String, MailboxCounts>>> =
        Rc::new(RefCell::new(HashMap::new()));

    let with_counts = client.opts().counts;
    let counting = client.clone();
    let tree_cb = Rc::clone(&tree);
    let counts_cb = Rc::clone(&counts);
    client.list_directories(roots, move |directories| {
        if with_counts {
            counting.count_tree(&directories, move |c| {
                counts_cb.borrow_mut().insert(c.mailbox.clone(), c);
            });
        }
        *tree_cb.borrow_mut() = Some(directories);
    });
    client.event_loop().run();

    let Some(tree) = tree.borrow_mut().take() else {
        return;
    };
    let counts = counts.borrow();
    let rendered = if client.opts().json {
        let mut counts: Vec<&MailboxCounts> = counts.values().collect();
        counts.sort_by(|a, b| a.mailbox.cmp(&b.mailbox));
        serde_json::to_string_pretty(&serde_json::json!({
            "directories": tree,
            "counts": counts,
        }))
        .map(|s| s + "\n")
        .context("serialize directories")
    } else {
        Ok(render_directories(&tree, &counts))
    };
    *output.borrow_mut() = Some(rendered);
}
