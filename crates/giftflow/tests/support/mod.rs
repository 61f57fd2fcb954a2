#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Fake converter: copies its argument to `<stem>.myg` in the working dir.
pub const COPY_CONVERTER: &str = r#"base=$(basename "$1"); base=${base%.*}
cp "$1" "${base}.myg""#;

/// Like [`COPY_CONVERTER`], but fails for inputs whose name contains "bad".
pub const PICKY_CONVERTER: &str = r#"case "$(basename "$1")" in
  *bad*) echo "unsupported gift header" >&2; exit 2;;
esac
base=$(basename "$1"); base=${base%.*}
cp "$1" "${base}.myg""#;

pub const MAPPING_YAML: &str = r#"gamecode:
  "misc": MISC1
  "(?i)ranger": RNGR
region: {}
fallbacks:
  default_gamecode: ADAE
"#;

pub const EVENTS_CSV: &str = "EventName,GameCodes,Regions,Year
Zigzag,\"EUR1,EUR2\",EU,2024
Ranger Manaphy,MNPH,\"US,EU\",
";

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).expect("create script dir");
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Names of regular files directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

pub fn giftflow_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_giftflow"))
}

pub fn run_cli(args: &[String], home: &Path) -> Output {
    Command::new(giftflow_bin())
        .args(args)
        .env("GIFTFLOW_HOME", home)
        .env("RUST_LOG", "error")
        .env_remove("GIFTFLOW_CONVERTER")
        .output()
        .expect("failed to execute giftflow CLI")
}

pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}
