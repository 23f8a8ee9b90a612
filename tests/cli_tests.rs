use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_quit_exits_while_stdin_stays_open() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_divesim"))
        .args(["--tick-ms", "20"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    writeln!(stdin, "quit").unwrap();
    stdin.flush().unwrap();

    // stdin is held open for the whole wait
    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break Some(status);
        }
        if Instant::now() >= deadline {
            break None;
        }
        thread::sleep(Duration::from_millis(20));
    };

    if status.is_none() {
        let _ = child.kill();
    }
    drop(stdin);

    let status = status.expect("divesim still running after quit");
    assert!(status.success());
}
