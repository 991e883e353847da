mod common;

use common::lumea_release;
use predicates::prelude::*;

#[test]
fn resolves_musl_triple() {
    let tmp = tempfile::tempdir().unwrap();
    lumea_release(tmp.path())
        .args(["platform", "--triple", "aarch64-unknown-linux-musl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registry id: linux-arm64-musl"));
}

#[test]
fn resolves_darwin_and_eabi_triples() {
    let tmp = tempfile::tempdir().unwrap();
    lumea_release(tmp.path())
        .args(["platform", "--triple", "x86_64-apple-darwin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registry id: darwin-x64"));

    lumea_release(tmp.path())
        .args(["platform", "--triple", "armv7-unknown-linux-musleabi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registry id: linux-arm-eabi"));
}

#[test]
fn invalid_triple_exits_one() {
    let tmp = tempfile::tempdir().unwrap();
    lumea_release(tmp.path())
        .args(["platform", "--triple", "a-b-c-d-e"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid build triple"));
}

#[test]
fn host_platform_lists_launcher() {
    let tmp = tempfile::tempdir().unwrap();
    lumea_release(tmp.path())
        .arg("platform")
        .assert()
        .success()
        .stdout(predicate::str::contains("launcher:"))
        .stdout(predicate::str::contains("registry id:"));
}

#[test]
fn usage_errors_exit_one() {
    let tmp = tempfile::tempdir().unwrap();
    lumea_release(tmp.path())
        .arg("publish")
        .assert()
        .code(1);

    lumea_release(tmp.path()).arg("--help").assert().success();
}

#[test]
fn bad_config_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    common::write(tmp.path(), "lumea-release.toml", "[bundle]\nminify = true\n");
    lumea_release(tmp.path())
        .arg("platform")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lumea-release.toml"));
}
