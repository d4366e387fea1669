use log::{debug, warn};
use std::process::Child;

/// Undo a partially spawned pipeline: close the pipe ends still held, then kill and reap every
/// stage that did start. Called before the spawn error is returned.
pub fn rollback_stages(children: Vec<Child>) {
    if children.is_empty() {
        return;
    }
    warn!(
        "pipeline aborted; stopping {} already started stage(s)",
        children.len()
    );
    for mut child in children {
        let pid = child.id();
        drop(child.stdin.take());
        drop(child.stdout.take());
        if let Err(e) = child.kill() {
            debug!("pid {pid}: kill failed: {e}");
        }
        if let Err(e) = child.wait() {
            debug!("pid {pid}: wait failed: {e}");
        }
    }
}

/// Log a query that failed to start. The query's callback will never run.
pub fn report_failed_query(query: &str, err: &anyhow::Error) {
    warn!("{query}: {err:#}");
}
