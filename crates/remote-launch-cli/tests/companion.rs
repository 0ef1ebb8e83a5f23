//! Runs the built `remote-process-handler` binary

use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::Duration;

#[test]
fn test_companion_logs_plain_text_and_exits_cleanly_on_sigterm() {
    let child = Command::new(env!("CARGO_BIN_EXE_remote-process-handler"))
        .args([
            "--name",
            "remote_docker_process_handler_0123456789ab",
            "--namespace",
            "machine_robot_lan",
            "--poll-interval-secs",
            "1",
            "--config",
            r#"{"screen_process_name":"no_such_session_0123456789ab","docker_kill_command":"true"}"#,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    sleep(Duration::from_millis(500));
    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);
    assert!(stderr.contains("watching session"), "stderr: {}", stderr);
    assert!(stderr.contains("teardown complete"), "stderr: {}", stderr);
    assert!(!stderr.contains('\x1b'), "ANSI escapes in piped output: {:?}", stderr);
}
