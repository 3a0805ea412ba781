#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "altslave-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_script(tag: &str, body: &str) -> (PathBuf, PathBuf) {
    let dir = unique_temp_dir(tag);
    let path = dir.join("bus.script");
    std::fs::write(&path, body).expect("script should be writable");
    (dir, path)
}

fn altslave(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_altslave"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("altslave should run")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn replay_reports_cpu_message() {
    let (dir, script) = write_script("cpu", "write 0x00 0x11 0x22 0x33\n");

    let out = altslave(&["--format", "json", "replay", script.to_str().unwrap()]);
    let value = json_stdout(&out);

    assert_eq!(value["connection"], "i2c-0@0x3c");
    assert_eq!(value["state"], "idle");
    assert_eq!(value["sessions_completed"], 1);
    assert_eq!(value["len"], 36);
    let payload = value["cpu"]["payload"].as_str().unwrap();
    assert!(payload.starts_with("11 22 33 00"), "{payload}");
    assert_eq!(value["ddr"]["payload"], ["00"; 16].join(" "));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_raw_read_is_prefix_of_cpu_buffer() {
    let (dir, script) = write_script(
        "raw",
        "start\nbyte 0\nbyte 1\nbyte 2\nbyte 3\nbyte 4\nbyte 5\nbyte 6\nbyte 7\nbyte 8\nstop\n",
    );

    let out = altslave(&[
        "--format",
        "raw",
        "replay",
        script.to_str().unwrap(),
        "--len",
        "8",
    ]);
    assert!(out.status.success());
    assert_eq!(out.stdout, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let out = altslave(&[
        "--format",
        "raw",
        "replay",
        script.to_str().unwrap(),
        "--len",
        "100",
    ]);
    assert!(out.status.success());
    assert_eq!(out.stdout.len(), 36);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_wraps_long_ddr_session() {
    let bytes: Vec<String> = (0..20).map(|i| format!("0x{:02x}", 0xa0 + i)).collect();
    let (dir, script) = write_script("wrap", &format!("write 1 {}\n", bytes.join(" ")));

    let out = altslave(&["--format", "raw", "replay", script.to_str().unwrap()]);
    assert!(out.status.success());
    let ddr = &out.stdout[18..];
    assert_eq!(ddr[0], 0xa0 + 18);
    assert_eq!(ddr[1], 0xa0 + 19);
    assert_eq!(ddr[2], 0xa2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_invalid_selector_stores_nothing() {
    let (dir, script) = write_script("invalid", "write 5 1 2 3\nread\n");

    let out = altslave(&["--format", "raw", "replay", script.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(out.stdout, vec![0u8; 36]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_uses_config_file_and_address_override() {
    let (dir, script) = write_script("config", "write 0 0xee\n");
    let config = dir.join("device.json");
    std::fs::write(&config, r#"{"name": "bmc-link", "address": 32}"#).unwrap();

    let out = altslave(&[
        "--format",
        "json",
        "replay",
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--bus",
        "i2c-7",
    ]);
    let value = json_stdout(&out);
    assert_eq!(value["connection"], "i2c-7@0x20");
    assert_eq!(value["device"], "bmc-link");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_script_is_data_invalid() {
    let (dir, script) = write_script("malformed", "write 0 0x1ff\n");

    let out = altslave(&["replay", script.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&out.stderr).contains("script line 1"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_script_is_usage_error() {
    let out = altslave(&["replay", "/nonexistent/altslave/bus.script"]);
    assert_eq!(out.status.code(), Some(64));
}

#[test]
fn layout_lists_four_regions() {
    let out = altslave(&["--format", "json", "layout"]);
    let value = json_stdout(&out);
    assert_eq!(value["store_len"], 36);
    let regions = value["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 4);
    assert_eq!(regions[2]["offset"], 18);
}

#[test]
fn watch_stops_after_count() {
    let (dir, script) = write_script("watch", "write 1 0xd0 0xd1\n");

    let out = altslave(&[
        "--format",
        "pretty",
        "watch",
        script.to_str().unwrap(),
        "--interval",
        "10ms",
        "--count",
        "2",
    ]);
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.lines().all(|line| line.starts_with("connection=i2c-0@0x3c")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn watch_sessions_mode_sees_completed_session() {
    let (dir, script) = write_script("watch-sessions", "write 0 0x5a\n");

    let out = altslave(&[
        "--format",
        "json",
        "watch",
        script.to_str().unwrap(),
        "--interval",
        "10ms",
        "--sessions",
        "--count",
        "1",
    ]);
    let value = json_stdout(&out);
    let payload = value["cpu"]["payload"].as_str().unwrap();
    assert!(payload.starts_with("5a "), "{payload}");
    let data = value["data"].as_str().unwrap();
    assert!(data.starts_with("5a 00 "), "{data}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_name() {
    let out = altslave(&["version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("altslave "));
}
