// tests/supervisor_run.rs

#![cfg(unix)]

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use procrunner::errors::RunnerError;
use procrunner::exec::{CallbackMode, Callbacks, CommandSpec, ProcessSupervisor};
use procrunner_test_utils::builders::sh;
use procrunner_test_utils::callbacks::{RecordingCallback, failing_callback, panicking_callback};

/// 2000 lines of 17 bytes on stdout, 1000 lines of 9 bytes on stderr,
/// interleaved.
const NOISY: &str = r#"i=0
while [ $i -lt 2000 ]; do
  echo 0123456789abcdef
  if [ $((i % 2)) -eq 0 ]; then echo 'err-line' >&2; fi
  i=$((i+1))
done"#;
const NOISY_STDOUT_BYTES: usize = 2000 * 17;
const NOISY_STDERR_BYTES: usize = 1000 * 9;

#[tokio::test]
async fn test_echo_hello_exits_zero() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    let result = with_timeout(supervisor.run(&CommandSpec::new(["echo", "hello"]), &Callbacks::none())).await?;

    assert_eq!(result.exit_code, Some(0));
    assert!(result.success());
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.stderr, "");
    assert_eq!(supervisor.stdout(), "hello\n");
    assert!(!supervisor.is_running());
    Ok(())
}

#[tokio::test]
async fn test_nonzero_exit_code_and_stderr() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    let result = with_timeout(supervisor.run(&sh("echo oops >&2; exit 3"), &Callbacks::none())).await?;

    assert_eq!(result.exit_code, Some(3));
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "oops\n");
    Ok(())
}

#[tokio::test]
async fn test_byte_counts_without_callbacks() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    let result = with_timeout(supervisor.run(&sh(NOISY), &Callbacks::none())).await?;

    assert_eq!(result.stdout.len(), NOISY_STDOUT_BYTES);
    assert_eq!(result.stderr.len(), NOISY_STDERR_BYTES);
    assert_eq!(supervisor.stdout().len(), NOISY_STDOUT_BYTES);
    assert_eq!(supervisor.stderr().len(), NOISY_STDERR_BYTES);
    Ok(())
}

#[tokio::test]
async fn test_callbacks_see_everything_in_order() -> TestResult {
    init_tracing();

    let out = RecordingCallback::new();
    let err = RecordingCallback::new();
    let callbacks = Callbacks::none()
        .with_stdout(out.callback(CallbackMode::Inline))
        .with_stderr(err.callback(CallbackMode::Blocking));

    let supervisor = ProcessSupervisor::new();
    let result = with_timeout(supervisor.run(&sh(NOISY), &callbacks)).await?;

    assert_eq!(out.text(), result.stdout);
    assert_eq!(err.text(), result.stderr);
    assert_eq!(result.stdout.len(), NOISY_STDOUT_BYTES);
    assert_eq!(result.stderr.len(), NOISY_STDERR_BYTES);
    assert!(out.count() >= 1);
    Ok(())
}

#[tokio::test]
async fn test_failing_callbacks_do_not_reduce_capture() -> TestResult {
    init_tracing();

    let baseline = ProcessSupervisor::new();
    let expected = with_timeout(baseline.run(&sh(NOISY), &Callbacks::none())).await?;

    for mode in [CallbackMode::Inline, CallbackMode::Blocking] {
        let callbacks = Callbacks::none()
            .with_stdout(failing_callback(mode))
            .with_stderr(failing_callback(mode));

        let supervisor = ProcessSupervisor::new();
        let result = with_timeout(supervisor.run(&sh(NOISY), &callbacks)).await?;

        assert_eq!(result.exit_code, Some(0), "mode {mode:?}");
        assert_eq!(result.stdout.len(), expected.stdout.len(), "mode {mode:?}");
        assert_eq!(result.stderr.len(), expected.stderr.len(), "mode {mode:?}");
    }
    Ok(())
}

#[tokio::test]
async fn test_panicking_callbacks_are_isolated() -> TestResult {
    init_tracing();

    for mode in [CallbackMode::Inline, CallbackMode::Blocking] {
        let callbacks = Callbacks::none().with_stdout(panicking_callback(mode));

        let supervisor = ProcessSupervisor::new();
        let result = with_timeout(supervisor.run(&sh("echo one; echo two"), &callbacks)).await?;

        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "one\ntwo\n");
    }
    Ok(())
}

#[tokio::test]
async fn test_spawn_failure_has_no_partial_result() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    let spec = CommandSpec::new(["definitely-not-a-real-program-4821"]);

    match supervisor.run(&spec, &Callbacks::none()).await {
        Err(RunnerError::Spawn { program, .. }) => {
            assert_eq!(program, "definitely-not-a-real-program-4821");
        }
        other => panic!("Expected Spawn error, got: {:?}", other),
    }
    assert_eq!(supervisor.stdout(), "");
    assert_eq!(supervisor.stderr(), "");
    assert!(!supervisor.is_running());
    Ok(())
}

#[tokio::test]
async fn test_missing_cwd_is_a_spawn_failure() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    let spec = CommandSpec::new(["echo", "hi"]).cwd("/definitely/not/a/dir");

    let result = supervisor.run(&spec, &Callbacks::none()).await;
    assert!(matches!(result, Err(RunnerError::Spawn { .. })), "got {result:?}");
    Ok(())
}

#[tokio::test]
async fn test_empty_argv_is_rejected() -> TestResult {
    let supervisor = ProcessSupervisor::new();
    let spec = CommandSpec::new(Vec::<String>::new());

    let result = supervisor.run(&spec, &Callbacks::none()).await;
    assert!(matches!(result, Err(RunnerError::InvalidCommand(_))), "got {result:?}");
    Ok(())
}

#[tokio::test]
async fn test_cwd_and_env_are_applied() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let spec = sh("pwd; echo \"$GREETING\"")
        .cwd(dir.path())
        .env("GREETING", "hi there");

    let supervisor = ProcessSupervisor::new();
    let result = with_timeout(supervisor.run(&spec, &Callbacks::none())).await?;

    let mut lines = result.stdout.lines();
    let pwd = std::fs::canonicalize(lines.next().unwrap_or_default())?;
    assert_eq!(pwd, std::fs::canonicalize(dir.path())?);
    assert_eq!(lines.next(), Some("hi there"));
    Ok(())
}

#[tokio::test]
async fn test_sequential_runs_reset_buffers() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    with_timeout(supervisor.run(&sh("echo first; echo first-err >&2"), &Callbacks::none())).await?;
    let second = with_timeout(supervisor.run(&sh("echo second"), &Callbacks::none())).await?;

    assert_eq!(second.stdout, "second\n");
    assert_eq!(second.stderr, "");
    assert_eq!(supervisor.stdout(), "second\n");
    assert_eq!(supervisor.stderr(), "");
    Ok(())
}

#[tokio::test]
async fn test_clear_history_empties_buffers_only() -> TestResult {
    init_tracing();

    let supervisor = ProcessSupervisor::new();
    with_timeout(supervisor.run(&sh("echo out; echo err >&2"), &Callbacks::none())).await?;
    assert!(!supervisor.stdout().is_empty());

    supervisor.clear_history();
    assert_eq!(supervisor.stdout(), "");
    assert_eq!(supervisor.stderr(), "");
    assert!(!supervisor.is_running());
    Ok(())
}

#[tokio::test]
async fn test_is_running_and_snapshot_during_run() -> TestResult {
    init_tracing();

    let supervisor = Arc::new(ProcessSupervisor::new());
    let runner = Arc::clone(&supervisor);
    let handle = tokio::spawn(async move {
        runner
            .run(&sh("echo started; sleep 1; echo done"), &Callbacks::none())
            .await
    });

    // Wait until the first line has been captured.
    with_timeout(async {
        while supervisor.stdout() != "started\n" {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(supervisor.is_running());
    assert!(supervisor.pid().is_some());

    // Clearing history does not touch the running flag.
    supervisor.clear_history();
    assert!(supervisor.is_running());

    let result = with_timeout(handle).await??;
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.ends_with("done\n"));
    assert!(!supervisor.is_running());
    Ok(())
}

#[test]
fn test_run_sync_blocks_until_done() -> TestResult {
    let supervisor = ProcessSupervisor::new();
    let result = supervisor.run_sync(&sh("printf abc; printf xyz >&2"), &Callbacks::none())?;

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, "abc");
    assert_eq!(result.stderr, "xyz");
    Ok(())
}

#[test]
fn test_run_sync_with_logging_callbacks() -> TestResult {
    let supervisor = ProcessSupervisor::new();
    let result = supervisor.run_sync(&sh("echo logged"), &Callbacks::logging())?;

    assert_eq!(result.stdout, "logged\n");
    Ok(())
}
