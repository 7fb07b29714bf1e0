use std::{
    fs,
    io::Write,
    path::Path,
    process::{Child, Command, Output, Stdio},
    thread,
    time::Duration,
};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const LOGIN: &str = "alice\nsecret\n";

fn root() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("etc")).unwrap();
    fs::create_dir_all(dir.path().join("home/alice")).unwrap();
    fs::write(
        dir.path().join("etc/passwd.txt"),
        "root:toor:/home/root\nalice:secret:/home/alice\n",
    )
    .unwrap();
    dir
}

fn spawn(root: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_tsh"))
        .args(["-p", "-r"])
        .arg(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap()
}

fn run(root: &Path, input: &str) -> Output {
    let mut child = spawn(root);
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_and_usage_errors() {
    let output = Command::new(env!("CARGO_BIN_EXE_tsh"))
        .arg("-h")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("Usage: tsh"));

    let output = Command::new(env!("CARGO_BIN_EXE_tsh"))
        .arg("-x")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unrecognized option 'x'"));
}

#[test]
fn failed_login_then_quit() {
    let dir = root();
    let output = run(dir.path(), "alice\nwrong\nquit\n");

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("User Authentication failed. Please try again."));
    assert!(!dir.path().join("proc").exists());
}

#[test]
fn foreground_job_runs_to_completion() {
    let dir = root();
    let output = run(dir.path(), &format!("{LOGIN}echo 'hello  world'\njobs\nquit\n"));

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("hello  world\n"));
    // nothing left in the table
    assert!(!out.contains("Foreground"));
}

#[test]
fn background_job_is_listed_then_reaped() {
    let dir = root();
    let output = run(
        dir.path(),
        &format!("{LOGIN}sleep 0.3 &\njobs\nsleep 1\njobs\nquit\n"),
    );

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert_eq!(out.matches("Running sleep 0.3 &").count(), 1);
    assert!(out.contains("[1] ("));
}

#[test]
fn unknown_program() {
    let dir = root();
    let output = run(dir.path(), &format!("{LOGIN}no-such-program-tsh --flag\nquit\n"));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("no-such-program-tsh: Command not found"));
}

#[test]
fn builtin_errors_do_not_stop_the_shell() {
    let dir = root();
    let output = run(
        dir.path(),
        &format!("{LOGIN}fg\nbg %7\nfg 99999\nadduser bob pw\necho still here\nquit\n"),
    );

    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("fg command requires PID or %jobid argument"));
    assert!(err.contains("%7: No such job"));
    assert!(err.contains("(99999): No such process"));
    assert!(err.contains("root privileges required to run adduser."));
    assert!(stdout(&output).contains("still here"));
}

#[test]
fn suspended_jobs_block_quit() {
    let dir = root();
    let output = run(
        dir.path(),
        &format!("{LOGIN}sh -c 'kill -TSTP $$'\njobs\nquit\nquit -f\n"),
    );

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("stopped by signal 20"));
    assert!(out.contains("Stopped sh -c 'kill -TSTP $$'"));
    assert!(stderr(&output).contains("There are suspended jobs."));
}

#[test]
fn stopped_job_can_be_resumed() {
    let dir = root();
    let output = run(
        dir.path(),
        &format!("{LOGIN}sh -c 'kill -TSTP $$; echo resumed'\nfg %1\njobs\nquit\n"),
    );

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("stopped by signal 20"));
    assert!(out.contains("resumed\n"));
    assert!(!out.contains("Stopped sh"));
}

#[test]
fn interrupt_reaches_only_the_foreground_job() {
    let dir = root();
    let mut child = spawn(dir.path());
    let mut stdin = child.stdin.take().unwrap();
    stdin
        .write_all(format!("{LOGIN}sleep 3 &\nsleep 5\n").as_bytes())
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) };
    thread::sleep(Duration::from_millis(300));

    stdin.write_all(b"jobs\nquit\n").unwrap();
    drop(stdin);
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("terminated by signal 2"));
    assert!(out.contains("Running sleep 3 &"));
    assert!(!out.contains("sleep 5"));
}

#[test]
fn sigquit_terminates_the_shell() {
    let dir = root();
    let mut child = spawn(dir.path());
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(LOGIN.as_bytes()).unwrap();

    thread::sleep(Duration::from_millis(300));
    unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGQUIT) };

    let output = child.wait_with_output().unwrap();
    drop(stdin);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Terminating after receipt of SIGQUIT signal"));
}

#[test]
fn history_and_status_files() {
    let dir = root();
    let mut child = spawn(dir.path());
    let shell_pid = child.id();
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(format!("{LOGIN}jobs\n").as_bytes()).unwrap();

    let status = dir.path().join(format!("proc/{shell_pid}/status"));
    let mut contents = String::new();
    for _ in 0..50 {
        if let Ok(found) = fs::read_to_string(&status) {
            contents = found;
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert!(contents.contains("Name: Shell\n"));
    assert!(contents.contains("STAT: Ss\n"));
    assert!(contents.contains("Username: alice\n"));

    stdin.write_all(b"!1\nhistory\nquit\n").unwrap();
    drop(stdin);
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("1 jobs\n2 jobs\n3 history\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join("home/alice/.tsh_history")).unwrap(),
        "jobs\njobs\nhistory\nquit\n"
    );
    assert!(!status.exists());
}

#[test]
fn stop_request_suspends_the_foreground_job() {
    let dir = root();
    let mut child = spawn(dir.path());
    let mut stdin = child.stdin.take().unwrap();
    stdin
        .write_all(format!("{LOGIN}sleep 2\n").as_bytes())
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTSTP) };
    thread::sleep(Duration::from_millis(300));

    stdin.write_all(b"jobs\nbg %1\njobs\nquit\n").unwrap();
    drop(stdin);
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("stopped by signal 20"));
    let stopped = out.find("Stopped sleep 2").unwrap();
    let running = out.find("Running sleep 2").unwrap();
    assert!(stopped < running);
}

#[test]
fn full_table_refuses_new_jobs_until_they_finish() {
    let dir = root();
    let mut child = spawn(dir.path());
    let mut stdin = child.stdin.take().unwrap();
    let mut input = String::from(LOGIN);
    for _ in 0..17 {
        input.push_str("sleep 1 &\n");
    }
    stdin.write_all(input.as_bytes()).unwrap();

    thread::sleep(Duration::from_millis(2500));
    stdin.write_all(b"jobs\nsleep 0 &\nquit\n").unwrap();
    drop(stdin);
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stderr(&output).matches("Tried to create too many jobs").count(),
        1
    );
    let out = stdout(&output);
    let last_full = out.find("[16] (").unwrap();
    assert!(out.rfind("[1] (").unwrap() > last_full);
    assert!(out.contains(") sleep 0 &\n"));
    assert!(!out.contains("Running"));
}
