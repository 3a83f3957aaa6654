#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("repolens");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("GITHUB_TOKEN");
    command.env_remove("GEMINI_API_KEY");
    command.env_remove("RUST_LOG");
    (command, temp_home)
}

pub fn write_config(home: &Path, body: &str) {
    let config_dir = home.join(".config").join("repolens");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(config_dir.join("config.toml"), body).expect("write config");
}

pub fn write_mock_config(home: &Path, api_url: &str) {
    write_config(
        home,
        &format!(
            r#"
version = 1

[github]
api_url = "{api_url}"

[gemini]
api_url = "{api_url}"
model = "gemini-test"
api_key = "test-key"

[requests]
timeout_secs = 10
"#
        ),
    );
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
