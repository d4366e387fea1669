use mbtree::engine::CountSlot;
use mbtree::utils::{
    PackagePaths, ToolCommand, Tools, apply_file_to_opts, load_mbtree_toml, parse_mbtree_toml,
};
use mbtree::{
    Client, DirectoryNode, EventLoop, FanInContext, MailboxCounts, MessageNode, MessageStatus,
    Opts,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn script_tool(script: &str, name: &str) -> ToolCommand {
    ToolCommand(vec![
        "sh".to_string(),
        "-c".to_string(),
        script.to_string(),
        name.to_string(),
    ])
}

fn missing_tool() -> ToolCommand {
    ToolCommand::new("/nonexistent/mbtree-test-no-such-tool")
}

/// `mlist` stand-in: three messages, one of them unseen.
fn fake_mlist() -> ToolCommand {
    script_tool(
        "if [ \"$1\" = -s ]; then printf '/m/1\\n'; else printf '/m/1\\n/m/2\\n/m/3\\n'; fi",
        "mlist",
    )
}

/// `mscan` stand-in: two records, the second a reply to the first.
fn fake_mscan() -> ToolCommand {
    script_tool(
        "printf '%s\\n' '' /m/1 . Hello Ann Mon ' ' /m/2 ' ' 'Re: Hello' Bob Tue",
        "mscan",
    )
}

fn opts_with(tools: Tools, detect_virtual: bool) -> Opts {
    Opts {
        tools,
        detect_virtual,
        ..Opts::default()
    }
}

fn client(tools: Tools, detect_virtual: bool) -> (EventLoop, Client) {
    let event_loop = EventLoop::new();
    let client = Client::new(&event_loop, opts_with(tools, detect_virtual));
    (event_loop, client)
}

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("mbtree-test-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

// --- directories ---

#[test]
fn test_list_directories_builds_tree() {
    let tools = Tools {
        mdirs: script_tool(
            "printf '/m/work/a\\n/m/work/b\\n/m/personal/inbox\\n'",
            "mdirs",
        ),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let got: Rc<RefCell<Vec<Vec<DirectoryNode>>>> = Rc::default();
    let out = Rc::clone(&got);
    client.list_directories(&[], move |tree| out.borrow_mut().push(tree));
    event_loop.run();

    let got = got.borrow();
    assert_eq!(got.len(), 1);
    let tree = &got[0];
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "/m");
    let children: Vec<&str> = tree[0].children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(children, vec!["work", "personal/inbox"]);
    assert_eq!(
        tree[0].children[1].mailbox.as_deref(),
        Some("/m/personal/inbox")
    );
}

#[test]
fn test_list_directories_forwards_filters() {
    // Echo the arguments back: `-a` is relative and ignored, the filters become mailboxes.
    let tools = Tools {
        mdirs: script_tool("printf '%s\\n' \"$@\"", "mdirs"),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let got: Rc<RefCell<Option<Vec<DirectoryNode>>>> = Rc::default();
    let out = Rc::clone(&got);
    client.list_directories(&["/r1/x".to_string(), "/r2".to_string()], move |tree| {
        *out.borrow_mut() = Some(tree)
    });
    event_loop.run();

    let tree = got.borrow_mut().take().unwrap();
    let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["/r1/x", "/r2"]);
}

#[test]
fn test_list_directories_spawn_failure_skips_callback() {
    let tools = Tools {
        mdirs: missing_tool(),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let called = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&called);
    client.list_directories(&[], move |_| *flag.borrow_mut() = true);
    assert_eq!(event_loop.pending(), 0);
    event_loop.run();
    assert!(!*called.borrow());
}

// --- counts ---

#[test]
fn test_count_total_and_unseen() {
    let tools = Tools {
        mlist: fake_mlist(),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let got: Rc<RefCell<Vec<(String, String, usize)>>> = Rc::default();

    let out = Rc::clone(&got);
    client.count_total("/m", move |mailbox, n| {
        out.borrow_mut().push(("total".into(), mailbox, n))
    });
    let out = Rc::clone(&got);
    client.count_unseen("/m", move |mailbox, n| {
        out.borrow_mut().push(("unseen".into(), mailbox, n))
    });
    event_loop.run();

    let mut got = got.borrow().clone();
    got.sort();
    assert_eq!(
        got,
        vec![
            ("total".to_string(), "/m".to_string(), 3),
            ("unseen".to_string(), "/m".to_string(), 1),
        ]
    );
}

#[test]
fn test_count_empty_mailbox() {
    let tools = Tools {
        mlist: script_tool("true", "mlist"),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let got = Rc::new(RefCell::new(None));
    let out = Rc::clone(&got);
    client.count_total("/empty", move |_, n| *out.borrow_mut() = Some(n));
    event_loop.run();
    assert_eq!(*got.borrow(), Some(0));
}

#[test]
fn test_count_mailbox_releases_once() {
    let tools = Tools {
        mlist: fake_mlist(),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let got: Rc<RefCell<Vec<MailboxCounts>>> = Rc::default();
    let out = Rc::clone(&got);
    client.count_mailbox("/m", move |counts| out.borrow_mut().push(counts));
    event_loop.run();

    assert_eq!(
        *got.borrow(),
        vec![MailboxCounts {
            mailbox: "/m".to_string(),
            total: 3,
            unseen: 1,
        }]
    );
}

#[test]
fn test_count_tree_covers_every_mailbox() {
    let tools = Tools {
        mlist: fake_mlist(),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, false);
    let tree = mbtree::tree::build_directory_tree(["/m/a", "/m/b", "/m/b/c", "/n"]);
    let got: Rc<RefCell<BTreeMap<String, MailboxCounts>>> = Rc::default();
    let out = Rc::clone(&got);
    client.count_tree(&tree, move |counts| {
        out.borrow_mut().insert(counts.mailbox.clone(), counts);
    });
    event_loop.run();

    let got = got.borrow();
    let keys: Vec<&str> = got.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["/m/a", "/m/b", "/m/b/c", "/n"]);
    assert!(got.values().all(|c| c.total == 3 && c.unseen == 1));
}

// --- fan-in ---

fn two_writer_context() -> (Rc<FanInContext>, Rc<RefCell<Vec<MailboxCounts>>>) {
    let released: Rc<RefCell<Vec<MailboxCounts>>> = Rc::default();
    let out = Rc::clone(&released);
    let ctx = FanInContext::new("/m", move |counts| out.borrow_mut().push(counts));
    ctx.acquire();
    (ctx, released)
}

#[test]
fn test_fanin_total_first() {
    let (ctx, released) = two_writer_context();
    assert_eq!(ctx.outstanding(), 2);
    assert!(!ctx.complete(CountSlot::Total, 10));
    assert!(released.borrow().is_empty());
    assert!(ctx.complete(CountSlot::Unseen, 4));
    assert!(ctx.is_released());
    assert_eq!(
        *released.borrow(),
        vec![MailboxCounts {
            mailbox: "/m".to_string(),
            total: 10,
            unseen: 4,
        }]
    );
}

#[test]
fn test_fanin_unseen_first() {
    let (ctx, released) = two_writer_context();
    assert!(!ctx.complete(CountSlot::Unseen, 4));
    assert!(ctx.complete(CountSlot::Total, 10));
    let released = released.borrow();
    assert_eq!(released.len(), 1);
    assert_eq!((released[0].total, released[0].unseen), (10, 4));
}

#[test]
fn test_fanin_late_completion_ignored() {
    let (ctx, released) = two_writer_context();
    ctx.complete(CountSlot::Total, 1);
    ctx.complete(CountSlot::Unseen, 2);
    assert!(!ctx.complete(CountSlot::Total, 99));
    assert_eq!(ctx.outstanding(), 0);
    assert_eq!(released.borrow().len(), 1);
    assert_eq!(released.borrow()[0].total, 1);
}

#[test]
fn test_fanin_single_writer() {
    let released: Rc<RefCell<Vec<MailboxCounts>>> = Rc::default();
    let out = Rc::clone(&released);
    let ctx = FanInContext::new("/solo", move |counts| out.borrow_mut().push(counts));
    assert!(ctx.complete(CountSlot::Total, 5));
    assert_eq!(released.borrow()[0].unseen, 0);
}

// --- messages ---

fn message_tools(mscan: ToolCommand) -> Tools {
    Tools {
        mlist: script_tool("printf '/m/1\\n/m/2\\n'", "mlist"),
        mthread: script_tool("cat", "mthread"),
        mscan,
        ..Tools::default()
    }
}

fn run_list_messages(tools: Tools, detect_virtual: bool) -> Vec<(String, Vec<MessageNode>)> {
    let (event_loop, client) = client(tools, detect_virtual);
    let got: Rc<RefCell<Vec<(String, Vec<MessageNode>)>>> = Rc::default();
    let out = Rc::clone(&got);
    client.list_messages("/m", move |mailbox, msgs| {
        out.borrow_mut().push((mailbox, msgs))
    });
    event_loop.run();
    got.take()
}

#[test]
fn test_list_messages_threads() {
    let got = run_list_messages(message_tools(fake_mscan()), false);
    assert_eq!(got.len(), 1);
    let (mailbox, msgs) = &got[0];
    assert_eq!(mailbox, "/m");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].id, "/m/1");
    assert_eq!(msgs[0].status, MessageStatus::Unseen);
    assert_eq!(msgs[0].subject, "Hello");
    assert_eq!(msgs[0].children.len(), 1);
    let reply = &msgs[0].children[0];
    assert_eq!(reply.id, "/m/2");
    assert_eq!(reply.status, MessageStatus::Seen);
    assert_eq!(reply.sender, "Bob");
}

#[test]
fn test_list_messages_marks_missing_files_virtual() {
    let got = run_list_messages(message_tools(fake_mscan()), true);
    let msgs = &got[0].1;
    assert_eq!(msgs[0].status, MessageStatus::Virtual);
    assert_eq!(msgs[0].children[0].status, MessageStatus::Virtual);
}

#[test]
fn test_list_messages_keeps_existing_files() {
    let path = temp_file("existing-message", "Subject: hi\n\nbody\n");
    let script = format!(
        "printf '%s\\n' '' '{}' . Hi Ann Mon",
        path.display()
    );
    let got = run_list_messages(message_tools(script_tool(&script, "mscan")), true);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(got[0].1[0].status, MessageStatus::Unseen);
}

#[test]
fn test_list_messages_middle_stage_failure_skips_callback() {
    let tools = Tools {
        mthread: missing_tool(),
        ..message_tools(fake_mscan())
    };
    assert!(run_list_messages(tools, false).is_empty());
}

// --- body ---

#[test]
fn test_fetch_body_reads_whole_output() {
    let text: String = (0..200).map(|i| format!("body line {i}\n")).collect();
    let path = temp_file("body", &text);
    let tools = Tools {
        mshow: ToolCommand::new("cat"),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, true);
    let got: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
    let out = Rc::clone(&got);
    let id = path.display().to_string();
    client.fetch_body(&id, move |id, body| out.borrow_mut().push((id, body)));
    event_loop.run();
    std::fs::remove_file(&path).unwrap();

    let got = got.borrow();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0, id);
    assert_eq!(got[0].1, text);
}

#[test]
fn test_fetch_body_missing_file_is_empty_without_spawn() {
    let tools = Tools {
        mshow: missing_tool(),
        ..Tools::default()
    };
    let (event_loop, client) = client(tools, true);
    let got: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
    let out = Rc::clone(&got);
    client.fetch_body("/nonexistent/m/1", move |id, body| {
        out.borrow_mut().push((id, body))
    });
    assert!(got.borrow().is_empty());
    event_loop.run();
    assert_eq!(
        *got.borrow(),
        vec![("/nonexistent/m/1".to_string(), String::new())]
    );
}

// --- config ---

#[test]
fn test_tool_command_parse() {
    assert_eq!(ToolCommand::parse("   "), None);
    assert_eq!(
        ToolCommand::parse(" mscan  -n "),
        Some(ToolCommand(vec!["mscan".to_string(), "-n".to_string()]))
    );
}

#[test]
fn test_tool_command_spec_appends_args() {
    let cmd = ToolCommand(vec!["env".to_string(), "MBLAZE=/tmp/x".to_string(), "mlist".to_string()]);
    let spec = cmd.spec(["-s", "/m"]);
    assert_eq!(spec.program, "env");
    assert_eq!(spec.args, vec!["MBLAZE=/tmp/x", "mlist", "-s", "/m"]);
}

#[test]
fn test_tool_env_var_name() {
    assert_eq!(PackagePaths::get().tool_env_var("mscan"), "MBTREE_MSCAN");
    assert_eq!(PackagePaths::get().config_filename(), ".mbtree.toml");
}

#[test]
fn test_file_config_overrides_defaults() {
    let file = parse_mbtree_toml(
        r#"
[tools]
mshow = ["mshow", "-n"]
mdirs = []

[settings]
detect_virtual = false
counts = true
"#,
    )
    .unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&file, &mut opts);

    assert_eq!(
        opts.tools.mshow,
        ToolCommand(vec!["mshow".to_string(), "-n".to_string()])
    );
    assert_eq!(opts.tools.mdirs, ToolCommand::new("mdirs"));
    assert!(!opts.detect_virtual);
    assert!(opts.counts);
    assert!(!opts.json);
}

#[test]
fn test_file_config_invalid_is_none() {
    assert!(parse_mbtree_toml("[settings]\ncounts = \"yes\"\n").is_none());
    assert!(parse_mbtree_toml("").is_some());
}

#[test]
fn test_load_config_from_directory() {
    let dir = std::env::temp_dir().join(format!("mbtree-test-{}-config", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    assert!(load_mbtree_toml(&dir).is_none());

    let file = dir.join(PackagePaths::get().config_filename());
    std::fs::write(&file, "[settings]\njson = true\n").unwrap();
    let loaded = load_mbtree_toml(&dir).unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&loaded, &mut opts);
    assert!(opts.json);

    std::fs::write(&file, "[settings]\njson = 1\n").unwrap();
    assert!(load_mbtree_toml(&dir).is_none());
    std::fs::remove_dir_all(&dir).unwrap();
}
