//! Smoke tests -- verify the binary runs and key subcommands work.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("runwatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("asynchronous test runner"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("runwatch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("runwatch"));
}

#[test]
fn test_serve_subcommand_exists() {
    Command::cargo_bin("runwatch")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success();
}

#[test]
fn test_catalog_json() {
    Command::cargo_bin("runwatch")
        .unwrap()
        .args(["catalog", "--json"])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"totalSubjects\": 13"));
}

#[test]
fn test_run_one_with_instant_runner() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("runwatch.toml");
    std::fs::write(&config, "[runner]\ntime_scale = 0.0\n").unwrap();

    Command::cargo_bin("runwatch")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["run-one", "Foo", "bar"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Foo.bar"))
        .stdout(predicates::str::contains("COMPLETED: 1 passed, 0 failed, 0 skipped"));
}

#[test]
fn test_missing_config_file_fails() {
    Command::cargo_bin("runwatch")
        .unwrap()
        .args(["--config", "/definitely/not/here.toml", "catalog"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to read config file"));
}
