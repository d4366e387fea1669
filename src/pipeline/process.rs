//! Process chains: spawn stages with stdout → stdin redirection and expose the last stdout.

use anyhow::{Context, Result, bail};
use log::debug;
use std::fmt;
use std::process::{Child, ChildStdout, Command, Stdio};

use super::error_handler::rollback_stages;

/// Program and arguments of one pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self, stdin: Stdio) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// Running chain of processes. Owns every child and the final stdout.
pub struct ProcessPipeline {
    children: Vec<Child>,
    stdout: ChildStdout,
}

impl ProcessPipeline {
    /// Spawn `specs` in order, piping each stdout into the next stdin. The first stage reads
    /// from the null device.
    ///
    /// If a stage fails to start, the stages already running are killed and reaped and their
    /// pipe ends closed before the error is returned.
    pub fn spawn(specs: &[ProcessSpec]) -> Result<Self> {
        if specs.is_empty() {
            bail!("cannot spawn an empty pipeline");
        }

        let mut children: Vec<Child> = Vec::with_capacity(specs.len());
        let mut upstream: Option<ChildStdout> = None;

        for (stage, spec) in specs.iter().enumerate() {
            let stdin = match upstream.take() {
                Some(out) => Stdio::from(out),
                None => Stdio::null(),
            };
            // On failure the Command (and the upstream pipe end moved into it) is dropped here.
            let spawned = spec
                .command(stdin)
                .spawn()
                .with_context(|| format!("spawn stage {} ({})", stage + 1, spec));
            let mut child = match spawned {
                Ok(child) => child,
                Err(err) => {
                    rollback_stages(children);
                    return Err(err);
                }
            };
            debug!("stage {} started: {} (pid {})", stage + 1, spec, child.id());
            upstream = child.stdout.take();
            children.push(child);
        }

        let Some(stdout) = upstream else {
            rollback_stages(children);
            bail!("last stage has no stdout pipe");
        };
        Ok(Self { children, stdout })
    }

    /// Number of running stages.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Process ids of the stages, first to last.
    pub fn pids(&self) -> Vec<u32> {
        self.children.iter().map(Child::id).collect()
    }

    pub(crate) fn into_parts(self) -> (ChildStdout, Vec<Child>) {
        (self.stdout, self.children)
    }
}

/// Wait for every stage to exit. A failing status is only logged.
pub(crate) fn reap_stages(children: Vec<Child>) {
    for mut child in children {
        let pid = child.id();
        match child.wait() {
            Ok(status) if status.success() => debug!("pid {pid} exited"),
            Ok(status) => debug!("pid {pid} exited with {status}"),
            Err(e) => debug!("pid {pid}: wait failed: {e}"),
        }
    }
}
