use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn filtrandmill(config_dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_filtrandmill"));
    command
        .env("FILTRANDMILL_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "error");
    command
}

#[test]
fn formula_json_is_reproducible_for_a_seed() {
    let root = TempDir::new().unwrap();

    let run = || {
        let output = filtrandmill(root.path())
            .args(["formula", "--seed", "1234", "--count", "3", "--json"])
            .output()
            .expect("failed to run filtrandmill formula");
        assert!(output.status.success());
        serde_json::from_slice::<serde_json::Value>(&output.stdout).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);

    let entries = first.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        let red = entry["formula"]["red"].as_array().unwrap();
        assert_eq!(red.len() % 2, 1);
        assert!(red.len() <= 33);
        assert!(entry["red"].as_str().unwrap().contains("normalizeMult"));
    }
}

#[test]
fn formula_compiles_supplied_tokens() {
    let root = TempDir::new().unwrap();
    let output = filtrandmill(root.path())
        .args(["formula", "--tokens", "10,20,00", "--tokens", "0x12"])
        .output()
        .expect("failed to run filtrandmill formula");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("#0 [10 20 00]"));
    assert!(stdout.contains("#1 [12]"));
    assert!(stdout.contains("red:"));
    assert!(stdout.contains("blue:"));
}

#[test]
fn formula_rejects_malformed_tokens() {
    let root = TempDir::new().unwrap();
    let output = filtrandmill(root.path())
        .args(["formula", "--tokens", "20,10"])
        .output()
        .expect("failed to run filtrandmill formula");

    assert!(!output.status.success());
}

#[test]
fn formula_uses_generator_settings_from_config() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("gallery.toml"),
        "[generator]\nmax_operators = 0\nseed = 5\n",
    )
    .unwrap();

    let output = filtrandmill(root.path())
        .args(["formula", "--count", "4", "--json"])
        .output()
        .expect("failed to run filtrandmill formula");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for entry in value.as_array().unwrap() {
        assert_eq!(entry["formula"]["red"].as_array().unwrap().len(), 1);
    }
}
