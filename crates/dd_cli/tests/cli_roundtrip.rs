use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use dd_core::{FieldKey, Node, encode, name_hash};
use serde_json::Value;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dd-se"))
        .args(args)
        .output()
        .expect("failed to run dd-se CLI")
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{}_{}", std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn wallet_bytes() -> Vec<u8> {
    encode(&Node::Object(vec![
        (FieldKey::Name("currency".into()), Node::Int(1000)),
        (FieldKey::Unresolved(name_hash("trinket_count")), Node::Int(3)),
    ]))
}

#[test]
fn decode_edit_encode_matches_direct_encode() {
    let dir = temp_dir("dd_se_pipeline");
    let save = dir.join("persist.wallet.json");
    let names = dir.join("names.txt");
    let text_path = dir.join("wallet.txt");
    let out = dir.join("persist.wallet.out.json");

    fs::write(&save, wallet_bytes()).expect("write save");
    fs::write(&names, "# harvested names\ncurrency\n\ntrinket_count\n").expect("write names");

    let output = run_cli(&[
        "decode",
        save.to_str().unwrap(),
        "--names",
        names.to_str().unwrap(),
        "-o",
        text_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let text = fs::read_to_string(&text_path).expect("read decoded text");
    assert!(text.contains("\"currency\": 1000"));
    assert!(text.contains("\"trinket_count\": 3"));

    let edited = text.replace("1000", "2500");
    fs::write(&text_path, &edited).expect("write edited text");

    let output = run_cli(&[
        "encode",
        text_path.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "encode failed: {output:?}");

    let expected = encode(&Node::Object(vec![
        (FieldKey::Name("currency".into()), Node::Int(2500)),
        (FieldKey::Unresolved(name_hash("trinket_count")), Node::Int(3)),
    ]));
    assert_eq!(fs::read(&out).expect("read encoded save"), expected);
}

#[test]
fn decode_without_names_shows_sentinels() {
    let dir = temp_dir("dd_se_nonames");
    let save = dir.join("persist.wallet.json");
    fs::write(&save, wallet_bytes()).expect("write save");

    let output = run_cli(&["decode", save.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("###{}", name_hash("currency"))));
    assert!(stdout.contains(&format!("###{}", name_hash("trinket_count"))));
}

#[test]
fn roundtrip_reports_byte_identity() {
    let dir = temp_dir("dd_se_roundtrip");
    let save = dir.join("persist.estate.json");
    fs::write(&save, wallet_bytes()).expect("write save");

    let output = run_cli(&["roundtrip", save.to_str().unwrap()]);
    assert!(output.status.success(), "roundtrip failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("round-trip exactly"));
}

#[test]
fn decode_rejects_junk_with_offset_message() {
    let dir = temp_dir("dd_se_junk");
    let save = dir.join("persist.game.json");
    fs::write(&save, b"this is not a container").expect("write junk");

    let output = run_cli(&["decode", save.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad magic"), "stderr: {stderr}");
}

#[test]
fn check_reports_error_position() {
    let dir = temp_dir("dd_se_check");
    let text_path = dir.join("broken.txt");
    fs::write(&text_path, "{\n  \"a\" 1\n}\n").expect("write text");

    let output = run_cli(&["check", text_path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr: {stderr}");

    fs::write(&text_path, "{\n  \"a\": 1\n}\n").expect("write text");
    let output = run_cli(&["check", text_path.to_str().unwrap()]);
    assert!(output.status.success());
}

#[test]
fn check_reports_root_shape() {
    let dir = temp_dir("dd_se_check_root");
    let text_path = dir.join("empty.txt");
    fs::write(&text_path, "{}\n").expect("write text");

    let output = run_cli(&["check", text_path.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("an object with 0 field(s)"),
        "stdout: {stdout}"
    );
}

#[test]
fn hash_prints_known_values() {
    let output = run_cli(&["hash", "gold", "--json"]);
    assert!(output.status.success());
    let json: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["gold"], 15651954);

    let output = run_cli(&["hash", "gold"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "gold\t15651954");
}

#[test]
fn scan_lists_known_components() {
    let dir = temp_dir("dd_se_scan");
    fs::write(dir.join("persist.wallet.json"), wallet_bytes()).expect("write");
    fs::write(dir.join("persist.roster.json"), wallet_bytes()).expect("write");
    fs::write(dir.join("notes.json"), b"{}").expect("write");

    let output = run_cli(&["scan", dir.to_str().unwrap(), "--json"]);
    assert!(output.status.success());
    let json: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    let stems: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|item| item["stem"].as_str().expect("stem"))
        .collect();
    assert_eq!(stems, vec!["persist.roster", "persist.wallet"]);
}
