#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

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

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

#[test]
fn encode_prints_wire_bytes() {
    let output = pushclone(&["--format", "pretty", "encode", "HANDSHAKE", "--data", "PC"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "F0 7F 00 7F 60 00 00 02 50 43 73 F7"
    );
}

#[test]
fn decode_accepts_encoded_frame() {
    let output = pushclone(&[
        "--format",
        "json",
        "decode",
        "F0 7F 00 7F 60 00 00 02 50 43 73 F7",
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(str_field(&lines[0], "command_name"), Some("HANDSHAKE"));
    assert_eq!(str_field(&lines[0], "route"), Some("known"));
    assert_eq!(str_field(&lines[0], "payload"), Some("50 43"));
}

#[test]
fn commands_lists_canonical_table() {
    let output = pushclone(&["--format", "json", "commands"]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    let commands = lines[0]
        .get("commands")
        .and_then(|v| v.as_array())
        .expect("commands array");
    let handshake = commands
        .iter()
        .find(|c| str_field(c, "name") == Some("HANDSHAKE"))
        .expect("HANDSHAKE listed");
    assert_eq!(handshake.get("id").and_then(|v| v.as_u64()), Some(0x60));
    assert_eq!(str_field(handshake, "direction"), Some("bidirectional"));
}

#[test]
fn send_then_listen_round_trips_through_port_file() {
    let dir = unique_temp_dir("send-listen");
    let port = dir.join("port.syx");
    std::fs::write(&port, b"").expect("port file should be writable");
    let port_arg = port.to_string_lossy().to_string();

    let sent = pushclone(&[
        "--format", "json", "send", &port_arg, "--command", "0x71", "--sequence", "9", "--hex",
        "01",
    ]);
    assert!(sent.status.success());

    let heard = pushclone(&["--format", "json", "listen", &port_arg, "--count", "1"]);
    assert!(heard.status.success());
    let lines = json_lines(&heard);
    assert_eq!(lines.len(), 1);
    assert_eq!(str_field(&lines[0], "command_name"), Some("RING_NAVIGATE"));
    assert_eq!(lines[0].get("sequence").and_then(|v| v.as_u64()), Some(9));
    assert_eq!(str_field(&lines[0], "origin"), Some("in"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn simulate_handshake_connects_and_routes_taps() {
    let output = pushclone(&[
        "--format",
        "json",
        "simulate",
        "--size",
        "8x8",
        "--step",
        "handshake",
        "--step",
        "tap 0 1",
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);

    let sent: Vec<&str> = lines
        .iter()
        .filter(|l| str_field(l, "kind") == Some("frame"))
        .filter_map(|l| str_field(l, "command_name"))
        .collect();
    assert_eq!(sent.first(), Some(&"HANDSHAKE"));
    assert!(sent.contains(&"HANDSHAKE_REPLY"));
    assert!(sent.contains(&"RING_POSITION"));
    assert!(sent.contains(&"NEOTRELLIS_CLIP_GRID"));

    let request = lines
        .iter()
        .find(|l| str_field(l, "kind") == Some("request"))
        .expect("tap should produce a host request");
    assert_eq!(str_field(request, "type"), Some("fire_clip"));
    assert_eq!(request.get("track").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(request.get("scene").and_then(|v| v.as_u64()), Some(1));

    let summary = lines.last().expect("summary line");
    assert_eq!(str_field(summary, "kind"), Some("summary"));
    assert_eq!(str_field(summary, "state"), Some("connected"));
}

#[test]
fn simulate_rejects_unknown_steps() {
    let output = pushclone(&["simulate", "--step", "dance"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = pushclone(&["version"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("pushclone {}", env!("CARGO_PKG_VERSION"))
    );
}
