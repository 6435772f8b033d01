//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reelforge_bin(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reelforge").expect("binary is built");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("ELEVENLABS_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stitch"))
        .stdout(predicate::str::contains("crop"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelforge"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn stitch_help_lists_options() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .args(["stitch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--audio"))
        .stdout(predicate::str::contains("--duration"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--encodings"));
}

#[test]
fn stitch_without_images_is_usage_error() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home).arg("stitch").assert().code(2);
}

#[test]
fn config_path_uses_xdg_config_home() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join("reelforge").join("config.toml");
    reelforge_bin(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().to_string()));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .args(["config", "set", "image_duration", "4s"])
        .assert()
        .success();
    reelforge_bin(&home)
        .args(["config", "get", "image_duration"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4s"));
}

#[test]
fn config_list_masks_api_keys() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .args(["config", "set", "gemini_api_key", "AIzaSyExampleKey1234"])
        .assert()
        .success();
    reelforge_bin(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AIza...1234"))
        .stdout(predicate::str::contains("AIzaSyExampleKey1234").not());
}

#[test]
fn generate_image_prints_url() {
    let home = TempDir::new().unwrap();
    reelforge_bin(&home)
        .args(["generate", "image", "red fox", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("https://image.pollinations.ai/prompt/red%20fox?"))
        .stdout(predicate::str::contains("width=720"))
        .stdout(predicate::str::contains("height=1280"))
        .stdout(predicate::str::contains("seed=7"));
}
