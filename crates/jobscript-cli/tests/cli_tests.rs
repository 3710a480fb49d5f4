//! CLI tests.
//!
//! Each test runs the `jobscript` binary in a scratch directory with
//! `JOBSCRIPT_CONFIG` pointing into it, so no user configuration leaks in.

use std::path::Path;
use std::process::{Command, Output};

fn jobscript(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jobscript"))
        .args(args)
        .current_dir(dir)
        .env("JOBSCRIPT_CONFIG", dir.join("user.yaml"))
        .output()
        .expect("failed to run jobscript")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_platforms_lists_registry() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(dir.path(), &["platforms"]);
    assert!(output.status.success());

    let text = stdout(&output);
    for name in ["slurm", "lsf", "print", "local"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
    assert!(text.contains("#SBATCH"));
}

#[test]
fn test_script_for_slurm() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &[
            "script", "--platform", "slurm", "--name", "fit", "--array", "1-3", "--runtime",
            "1:30", "--", "python", "fit.py",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("#!/bin/sh\n"));
    assert!(text.contains("#SBATCH --job-name=fit\n"));
    assert!(text.contains("#SBATCH -a 1-3\n"));
    assert!(text.contains("#SBATCH -t 1:30:00\n"));
    assert!(text.contains("#SBATCH -o fit-%A-%a.out\n"));
    assert!(text.contains("\nrun python fit.py\n"));
    assert!(text.ends_with("exit $status\n"));
}

#[test]
fn test_script_keeps_argument_quoting() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &["script", "--platform", "slurm", "--", "sh", "-c", "echo a; echo b"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("\nrun sh -c 'echo a; echo b'\n"));
}

#[test]
fn test_script_single_argument_is_shell_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &["script", "--platform", "slurm", "--", "./step | tee out.txt"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("\nrun ./step | tee out.txt\n"));
}

#[test]
fn test_script_uses_configured_platform() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("user.yaml"),
        "defaults:\n  platform: lsf\n  queue: normal\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("jobscript.yaml"), "lsf:\n  queue: short\n").unwrap();

    let output = jobscript(dir.path(), &["script", "--", "./run.sh"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("#BSUB -q short\n"));
    assert!(text.contains("export JOBID=$LSB_JOBID\n"));
}

#[test]
fn test_unknown_platform_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(dir.path(), &["script", "--platform", "pbs", "--", "true"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown platform: pbs"));
}

#[test]
fn test_bad_array_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &["script", "--platform", "slurm", "--array", "1-x", "--", "true"],
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_command_required() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(dir.path(), &["script", "--platform", "slurm"]);
    assert!(!output.status.success());
}

#[test]
fn test_local_submit_runs_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &["submit", "--platform", "local", "--", "touch", "ran.txt"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("ran.txt").exists());
}

#[test]
fn test_local_submit_quoted_argument() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(
        dir.path(),
        &["submit", "--platform", "local", "--", "touch", "with space.txt"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("with space.txt").exists());
    assert!(!dir.path().join("with").exists());
}

/// A reconciled SLURM directory: one clean job, one timed out.
fn log_dir(root: &Path) -> std::path::PathBuf {
    let logs = root.join("logs");
    std::fs::create_dir(&logs).unwrap();

    let script = "#!/bin/sh\n#SBATCH -o logs/%j.out\n#SBATCH -e logs/%j.err\n#PYJOB setup\n#PYJOB script\n\nrun ./step\n\n#PYJOB end\n";
    std::fs::write(logs.join("101.shell"), script).unwrap();
    std::fs::write(logs.join("102.shell"), script).unwrap();
    std::fs::write(logs.join("101.err"), "DONE\n").unwrap();
    std::fs::write(
        logs.join("102.err"),
        "pyjob: host: node5\nslurmstepd: error: *** JOB 102 ON node5 CANCELLED AT 2024-01-01T00:00:00 DUE TO TIME LIMIT ***\n",
    )
    .unwrap();
    logs
}

#[test]
fn test_checklog_json() {
    let dir = tempfile::tempdir().unwrap();
    log_dir(dir.path());

    let output = jobscript(
        dir.path(),
        &["checklog", "logs", "--platform", "slurm", "--format", "json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["completed"], 1);
    assert_eq!(summary["incomplete"], 1);
    assert_eq!(summary["results"]["TIMEOUT"], 1);
}

#[test]
fn test_checklog_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    log_dir(dir.path());

    let output = jobscript(
        dir.path(),
        &["checklog", "logs", "--platform", "slurm", "--format", "xml"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown format"));
}

#[test]
fn test_jobs_and_hosts() {
    let dir = tempfile::tempdir().unwrap();
    log_dir(dir.path());

    let output = jobscript(dir.path(), &["jobs", "logs", "--platform", "slurm"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("TIMEOUT"));
    assert!(text.contains("102"));
    assert!(text.contains("./step"));
    assert!(!text.contains("101"));

    let output = jobscript(dir.path(), &["hosts", "logs", "--platform", "slurm"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("node5"));
}

#[test]
fn test_checklog_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = jobscript(dir.path(), &["checklog", "nowhere", "--platform", "slurm"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Not a directory"));
}
