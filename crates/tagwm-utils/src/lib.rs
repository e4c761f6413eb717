use std::process::Stdio;
use std::sync::Mutex;

use sysinfo::{Pid, System};
use thiserror::Error;
use tokio::process;
use tracing::{debug, warn};

/// Error types for utilities
#[derive(Error, Debug)]
pub enum UtilError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Process execution failed: {command}")]
    ProcessFailed { command: String },

    #[error("No async runtime available to reap {command}")]
    NoRuntime { command: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parent lookup over the host process table.
pub trait ProcessTree {
    /// Parent pid of `pid`, or `None` when the process is gone or has no parent.
    fn parent_of(&self, pid: u32) -> Option<u32>;
}

/// Process table backed by sysinfo.
pub struct SystemProcessTree {
    system: Mutex<System>,
}

impl SystemProcessTree {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProcessTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTree for SystemProcessTree {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        let mut system = self.system.lock().ok()?;
        let pid = Pid::from_u32(pid);
        if !system.refresh_process(pid) {
            return None;
        }
        system
            .process(pid)
            .and_then(|process| process.parent())
            .map(|parent| parent.as_u32())
    }
}

/// Whether `pid` is `ancestor` itself or one of its descendants.
///
/// The walk stops at pid 0, at a process whose parent cannot be read, or at a
/// process that reports itself as its own parent.
pub fn is_descendant(tree: &dyn ProcessTree, ancestor: u32, pid: u32) -> bool {
    let mut current = pid;
    while current != 0 {
        if current == ancestor {
            return true;
        }
        match tree.parent_of(current) {
            Some(parent) if parent != current => current = parent,
            _ => return false,
        }
    }
    false
}

/// Launch `command` detached from the caller and return its pid.
///
/// The child gets its own process group and a null stdin. It is reaped on the
/// ambient tokio runtime, so nothing waits on it here.
pub fn spawn(command: &[String]) -> Result<u32, UtilError> {
    let (program, args) = command.split_first().ok_or(UtilError::EmptyCommand)?;
    let line = command.join(" ");

    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| UtilError::NoRuntime { command: line.clone() })?;
    let _guard = handle.enter();

    let mut child = process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| {
            warn!("spawn {} failed: {}", line, e);
            UtilError::ProcessFailed { command: line.clone() }
        })?;

    let pid = child.id().unwrap_or(0);
    debug!("spawned {} as pid {}", line, pid);

    handle.spawn(async move {
        if let Err(e) = child.wait().await {
            debug!("waiting for {} failed: {}", line, e);
        }
    });

    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeTree(HashMap<u32, u32>);

    impl ProcessTree for FakeTree {
        fn parent_of(&self, pid: u32) -> Option<u32> {
            self.0.get(&pid).copied()
        }
    }

    fn tree() -> FakeTree {
        // 1 -> 100 (terminal) -> 200 (shell) -> 300 (app); 1 -> 400
        FakeTree(HashMap::from([(100, 1), (200, 100), (300, 200), (400, 1), (1, 0)]))
    }

    #[test]
    fn test_descendant_chain() {
        let tree = tree();
        assert!(is_descendant(&tree, 100, 300));
        assert!(is_descendant(&tree, 100, 200));
        assert!(is_descendant(&tree, 300, 300));
        assert!(!is_descendant(&tree, 100, 400));
    }

    #[test]
    fn test_descendant_unknown_and_zero() {
        let tree = tree();
        assert!(!is_descendant(&tree, 100, 999));
        assert!(!is_descendant(&tree, 100, 0));
    }

    #[test]
    fn test_descendant_self_parent_terminates() {
        let tree = FakeTree(HashMap::from([(5, 5)]));
        assert!(!is_descendant(&tree, 7, 5));
    }

    #[test]
    fn test_own_process_is_tracked() {
        let tree = SystemProcessTree::new();
        let me = std::process::id();
        assert!(tree.parent_of(me).is_some());
        assert!(is_descendant(&tree, me, me));
    }

    #[test]
    fn test_spawn_empty_command() {
        assert!(matches!(spawn(&[]), Err(UtilError::EmptyCommand)));
    }

    #[test]
    fn test_spawn_without_runtime() {
        let result = spawn(&["true".to_string()]);
        assert!(matches!(result, Err(UtilError::NoRuntime { .. })));
    }

    #[tokio::test]
    async fn test_spawn_true() {
        let pid = spawn(&["true".to_string()]).unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn test_spawn_missing_program() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let result = spawn(&["/nonexistent/tagwm-test-binary".to_string()]);
        assert!(matches!(result, Err(UtilError::ProcessFailed { .. })));
    }

    #[test]
    fn test_reaper_runs_on_runtime() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let pid = spawn(&["sleep".to_string(), "0".to_string()]).unwrap();
        assert!(pid > 0);
        tokio_test::block_on(async {
            tokio::task::yield_now().await;
        });
    }
}
