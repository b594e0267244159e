//! Integration tests for the matchvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Interactive password prompts are impossible to drive from here, so
//! every invocation passes `--password` or sets `MATCH_PASSWORD`; the
//! storage-facing commands are only exercised up to their configuration
//! errors (the real backends are covered by the storage test suites).

use std::fs;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: get a Command pointing at the matchvault binary with a clean
/// environment for the variables the CLI reads.
fn matchvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("matchvault").expect("binary should exist");
    for var in [
        "MATCH_PASSWORD",
        "MATCH_GIT_URL",
        "MATCH_GIT_BRANCH",
        "GITLAB_HOST",
        "GITLAB_PROJECT",
        "CI_JOB_TOKEN",
        "PRIVATE_TOKEN",
        "CI_API_V4_URL",
        "CI_PROJECT_ID",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ---------------------------------------------------------------------------
// Surface checks
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    matchvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Sync encrypted code-signing certificates and profiles",
        ))
        .stdout(predicate::str::contains("encrypt"))
        .stdout(predicate::str::contains("decrypt"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("change-password"))
        .stdout(predicate::str::contains("nuke"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn version_flag_shows_version() {
    matchvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("matchvault"));
}

#[test]
fn no_args_shows_help() {
    matchvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ---------------------------------------------------------------------------
// Single-file encrypt / decrypt
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_round_trip() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("cert.p12");
    fs::write(&file, b"certificate bytes").unwrap();
    let path = file.to_str().unwrap();

    matchvault()
        .args(["encrypt", path, "--password", "round trip pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted"));

    let sealed = fs::read(&file).unwrap();
    assert!(sealed.starts_with(b"match_encrypted_v2__"));

    matchvault()
        .args(["decrypt", path, "--password", "round trip pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Decrypted"));

    assert_eq!(fs::read(&file).unwrap(), b"certificate bytes");
}

#[test]
fn legacy_flag_emits_openssl_format() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("profile.mobileprovision");
    fs::write(&file, b"profile payload").unwrap();

    matchvault()
        .args([
            "encrypt",
            file.to_str().unwrap(),
            "--password",
            "legacy pw",
            "--legacy",
        ])
        .assert()
        .success();

    assert!(fs::read(&file).unwrap().starts_with(b"Salted__"));
}

#[test]
fn password_env_var_is_used() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("cert.cer");
    fs::write(&file, b"cer bytes").unwrap();
    let path = file.to_str().unwrap();

    matchvault()
        .args(["encrypt", path])
        .env("MATCH_PASSWORD", "env password")
        .assert()
        .success();

    matchvault()
        .args(["decrypt", path])
        .env("MATCH_PASSWORD", "env password")
        .assert()
        .success();

    assert_eq!(fs::read(&file).unwrap(), b"cer bytes");
}

#[test]
fn password_flag_beats_env_var() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("cert.cer");
    fs::write(&file, b"cer bytes").unwrap();
    let path = file.to_str().unwrap();

    matchvault()
        .args(["encrypt", path, "--password", "flag password"])
        .env("MATCH_PASSWORD", "env password")
        .assert()
        .success();

    // Decrypting with the env value must fail: the flag won above.
    matchvault()
        .args(["decrypt", path])
        .env("MATCH_PASSWORD", "env password")
        .assert()
        .failure();

    matchvault()
        .args(["decrypt", path, "--password", "flag password"])
        .assert()
        .success();
}

#[test]
fn wrong_password_fails_with_hint() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("key.p8");
    fs::write(&file, b"key bytes").unwrap();
    let path = file.to_str().unwrap();

    matchvault()
        .args(["encrypt", path, "--password", "the real password"])
        .assert()
        .success();

    matchvault()
        .args(["decrypt", path, "--password", "not the password"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unable to decrypt"))
        .stdout(predicate::str::contains("correct password"));

    // The envelope is still intact after the failed attempt.
    assert!(fs::read(&file).unwrap().starts_with(b"match_encrypted_v2__"));
}

#[test]
fn output_path_leaves_input_untouched() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("cert.p12");
    let output = tmp.path().join("cert.p12.enc");
    fs::write(&input, b"plaintext").unwrap();

    matchvault()
        .args([
            "encrypt",
            input.to_str().unwrap(),
            "--password",
            "some password",
            "--output-path",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(fs::read(&input).unwrap(), b"plaintext");
    assert!(fs::read(&output).unwrap().starts_with(b"match_encrypted_v2__"));
}

#[test]
fn encrypting_twice_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("cert.p12");
    fs::write(&file, b"payload").unwrap();
    let path = file.to_str().unwrap();

    matchvault()
        .args(["encrypt", path, "--password", "some password"])
        .assert()
        .success();
    let first = fs::read(&file).unwrap();

    matchvault()
        .args(["encrypt", path, "--password", "some password"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already encrypted"));

    assert_eq!(fs::read(&file).unwrap(), first);
}

#[test]
fn missing_input_file_fails() {
    matchvault()
        .args(["encrypt", "/no/such/file.p12", "--password", "pw pw pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a file"));
}

// ---------------------------------------------------------------------------
// Configuration wiring
// ---------------------------------------------------------------------------

#[test]
fn storage_commands_require_a_git_url() {
    let tmp = TempDir::new().unwrap();

    matchvault()
        .arg("list")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("git URL"));
}

#[test]
fn empty_git_env_vars_count_as_unset() {
    let tmp = TempDir::new().unwrap();

    // An empty MATCH_GIT_URL must hit the configuration error, not a
    // git invocation with an empty URL.
    matchvault()
        .arg("list")
        .current_dir(tmp.path())
        .env("MATCH_GIT_URL", "")
        .env("MATCH_GIT_BRANCH", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no git URL configured"));
}

#[test]
fn unknown_storage_mode_is_rejected() {
    let tmp = TempDir::new().unwrap();

    matchvault()
        .args(["--storage", "s3", "list"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown storage mode"));
}

#[test]
fn init_writes_config_once() {
    let tmp = TempDir::new().unwrap();

    matchvault()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(".matchvault.toml"));
    assert!(tmp.path().join(".matchvault.toml").is_file());

    matchvault()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn completions_generate_a_script() {
    matchvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matchvault"));

    matchvault()
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown shell"));
}
