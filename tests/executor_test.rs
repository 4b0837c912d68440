//! End-to-end executor tests with a stub `adb` binary.
//!
//! The stub counts invocations in a scratch file and fails until a
//! threshold, which lets the tests drive the operator retry loop against
//! real subprocess execution.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

use hotpush::deploy::{BatchExecutor, BatchRunner, DeployContext, DeployError, ExecutionResult};
use hotpush::watcher::{ChangeEvent, ChangeKind};
use hotpush::ScriptedConfirm;

/// Install a stub `adb` that increments a counter and succeeds only once
/// the counter reaches `succeed_at` (0 keeps it failing forever).
fn install_stub_adb(bin_dir: &Path, state_dir: &Path, succeed_at: u32) {
    let counter = state_dir.join("invocations");
    fs::write(&counter, "0").unwrap();
    let stub = format!(
        "#!/bin/sh\n\
         count=$(cat {counter})\n\
         count=$((count + 1))\n\
         echo $count > {counter}\n\
         if [ {succeed_at} -gt 0 ] && [ $count -ge {succeed_at} ]; then exit 0; fi\n\
         exit 1\n",
        counter = counter.display(),
    );
    let adb_path = bin_dir.join("adb");
    fs::write(&adb_path, stub).unwrap();
    fs::set_permissions(&adb_path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn invocations(state_dir: &Path) -> u32 {
    fs::read_to_string(state_dir.join("invocations"))
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

fn executor(
    script_path: &Path,
    answers: Vec<bool>,
) -> BatchExecutor<ScriptedConfirm> {
    BatchExecutor::new(
        DeployContext::new("/proj", "x", "pages/home"),
        script_path.to_path_buf(),
        false,
        ScriptedConfirm::new(answers),
    )
}

fn push_batch() -> Vec<ChangeEvent> {
    vec![ChangeEvent::new(ChangeKind::Add, "/proj/res/img.png")]
}

// One test function: the stub adb is found through PATH, and PATH is
// process-global, so the scenarios run sequentially here.
#[tokio::test]
async fn executor_retry_flow_end_to_end() {
    let bin_dir = TempDir::new().unwrap();
    let state_dir = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let script_path = work_dir.path().join("update.sh");

    let old_path = std::env::var("PATH").unwrap_or_default();
    unsafe {
        std::env::set_var(
            "PATH",
            format!("{}:{}", bin_dir.path().display(), old_path),
        );
    }

    // Empty batch, no restart: the script is empty and succeeds without
    // ever invoking adb.
    let mut exec = executor(&script_path, vec![]);
    let result = exec.run(&Vec::new()).await.unwrap();
    assert_eq!(result, ExecutionResult::Success);
    assert!(!script_path.exists(), "script must be deleted after success");

    // Three failures answered "yes", then the fourth attempt succeeds;
    // no retry cap interferes.
    install_stub_adb(bin_dir.path(), state_dir.path(), 4);
    let mut exec = executor(&script_path, vec![true, true, true]);
    let result = exec.run(&push_batch()).await.unwrap();
    assert_eq!(result, ExecutionResult::Success);
    assert_eq!(invocations(state_dir.path()), 4);
    assert!(!script_path.exists());

    // Operator declines on the first failure: terminal Failed, exactly
    // one execution attempt, script cleaned up on the failure path too.
    install_stub_adb(bin_dir.path(), state_dir.path(), 0);
    let mut exec = executor(&script_path, vec![false]);
    let result = exec.run(&push_batch()).await.unwrap();
    assert_eq!(result, ExecutionResult::Failed);
    assert_eq!(invocations(state_dir.path()), 1);
    assert!(!script_path.exists(), "script must be deleted after failure");

    // Confirmation input exhausted (stands in for a closed stdin): the
    // error propagates instead of retrying blindly.
    install_stub_adb(bin_dir.path(), state_dir.path(), 0);
    let mut exec = executor(&script_path, vec![]);
    let err = exec.run(&push_batch()).await.unwrap_err();
    assert!(matches!(err, DeployError::ConfirmUnavailable { .. }));
    assert!(!script_path.exists());
}
