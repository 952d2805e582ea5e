//! Executable fragment runner.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::args::DirectiveArgs;

/// Polling interval while waiting for a fragment process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Whether executable fragments may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecPolicy {
    /// Not requested: the directive expands to nothing and a warning is logged.
    #[default]
    Skip,
    /// Run executable fragments.
    Allow,
    /// Explicitly refused: an executable fragment is an error.
    Deny,
}

/// Run `script` with `interpreter`, passing arguments as `--key=value`.
///
/// The process runs in `cwd` with stdin closed. Returns trimmed stdout, or
/// a message describing why the run failed. The process is killed once
/// `timeout` elapses.
pub(crate) fn run_fragment(
    interpreter: &[String],
    script: &Path,
    args: &DirectiveArgs,
    cwd: &Path,
    timeout: Duration,
) -> Result<String, String> {
    let (program, leading) = interpreter
        .split_first()
        .ok_or_else(|| "no interpreter configured".to_owned())?;

    tracing::debug!(
        program = %program,
        script = %script.display(),
        args = ?args.to_flags(),
        "Running executable fragment"
    );

    let mut child = Command::new(program)
        .args(leading)
        .arg(script)
        .args(args.to_flags())
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("cannot start {program}: {e}"))?;

    // Drain both pipes on their own threads so a chatty process can't block on a full pipe
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {timeout:?}"));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(format!("waiting for process: {e}")),
        }
    };

    let out = stdout_reader.join().unwrap_or_default();
    let err = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&err);
        return Err(format!("{status}: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&out).trim().to_owned())
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use super::*;

    fn sh() -> Vec<String> {
        vec!["sh".to_owned()]
    }

    #[test]
    fn test_stdout_trimmed_and_args_passed() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("gen.sh");
        fs::write(&script, "echo \"  got $1 $2  \"\n").unwrap();

        let args = DirectiveArgs::parse(r#"a="1" b="two""#);
        let out = run_fragment(&sh(), &script, &args, dir.path(), Duration::from_secs(5)).unwrap();
        assert_eq!(out, "got --a=1 --b=two");
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.txt"), "payload").unwrap();
        let script = dir.path().join("cat.sh");
        fs::write(&script, "cat data.txt\n").unwrap();

        let out = run_fragment(
            &sh(),
            &script,
            &DirectiveArgs::default(),
            dir.path(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out, "payload");
    }

    #[test]
    fn test_nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        fs::write(&script, "echo broken >&2\nexit 3\n").unwrap();

        let err = run_fragment(
            &sh(),
            &script,
            &DirectiveArgs::default(),
            dir.path(),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(err.contains("broken"), "{err}");
    }

    #[test]
    fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        fs::write(&script, "sleep 5\n").unwrap();

        let started = Instant::now();
        let err = run_fragment(
            &sh(),
            &script,
            &DirectiveArgs::default(),
            dir.path(),
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(err.contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_fragment(
            &["docco-no-such-interpreter".to_owned()],
            &dir.path().join("x"),
            &DirectiveArgs::default(),
            dir.path(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.contains("cannot start"), "{err}");
    }
}
