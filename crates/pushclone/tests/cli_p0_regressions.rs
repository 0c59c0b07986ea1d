#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

const HANDSHAKE_FRAME: &str = "F0 7F 00 7F 60 00 00 02 50 43 73 F7";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/pushclone-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn pushclone(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pushclone"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("pushclone should run")
}

#[test]
fn decode_reports_drop_reason_and_exits_60() {
    let corrupt = HANDSHAKE_FRAME.replace("73 F7", "74 F7");
    let output = pushclone(&["--format", "json", "decode", &corrupt]);

    assert_eq!(output.status.code(), Some(60));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("decode should emit json");
    assert_eq!(payload.get("valid"), Some(&serde_json::Value::Bool(false)));
    assert_eq!(
        payload.get("reason").and_then(|v| v.as_str()),
        Some("bad_checksum")
    );
}

#[test]
fn decode_flags_shape_mismatch_as_rejected() {
    // RING_NAVIGATE with two payload bytes instead of one.
    let output = pushclone(&[
        "--format",
        "json",
        "decode",
        "F0 7F 00 7F 71 00 00 02 01 01 71 F7",
    ]);

    assert_eq!(output.status.code(), Some(60));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("decode should emit json");
    assert_eq!(
        payload.get("route").and_then(|v| v.as_str()),
        Some("rejected")
    );
    assert_eq!(
        payload.get("reason").and_then(|v| v.as_str()),
        Some("payload_shape")
    );
}

#[test]
fn send_refuses_wrong_shape_unless_forced() {
    let dir = unique_temp_dir("send-shape");
    let port = dir.join("port.syx");
    std::fs::write(&port, b"").expect("port file should be writable");
    let port_arg = port.to_string_lossy().to_string();

    let refused = pushclone(&[
        "send",
        &port_arg,
        "--command",
        "RING_POSITION",
        "--hex",
        "00 00",
    ]);
    assert_eq!(refused.status.code(), Some(60));
    assert!(std::fs::read(&port).expect("port readable").is_empty());

    let forced = pushclone(&[
        "--format",
        "json",
        "send",
        &port_arg,
        "--command",
        "RING_POSITION",
        "--hex",
        "00 00",
        "--force",
    ]);
    assert!(forced.status.success());
    assert!(!std::fs::read(&port).expect("port readable").is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_on_missing_port_exits_3() {
    let missing = format!(
        "/tmp/pushclone-missing-{}-{}.syx",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    );

    let output = pushclone(&["listen", &missing]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn bad_config_file_is_a_usage_error() {
    let dir = unique_temp_dir("config");
    let config = dir.join("link.json");
    std::fs::write(&config, r#"{"grid": {"columns": 0}}"#).expect("config should be writable");

    let output = pushclone(&[
        "--config",
        &config.to_string_lossy(),
        "simulate",
        "--step",
        "handshake",
    ]);
    assert_eq!(output.status.code(), Some(64));

    let _ = std::fs::remove_dir_all(&dir);
}
