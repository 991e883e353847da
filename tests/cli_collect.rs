mod common;

use common::{copy_fixture, lumea_release, write};
use predicates::prelude::*;

#[test]
fn collects_artifacts_into_npm_packages() {
    let tmp = tempfile::tempdir().unwrap();
    copy_fixture("npm", &tmp.path().join("npm"));
    write(tmp.path(), "artifacts/bindings-x86_64-pc-windows-msvc/core-x86_64-pc-windows-msvc.exe", "MZ");
    write(tmp.path(), "artifacts/bindings-aarch64-unknown-linux-musl/core-aarch64-unknown-linux-musl", "ELF");
    write(tmp.path(), "artifacts/checksums.txt", "skip me");
    write(tmp.path(), "artifacts/node_modules/core-x86_64-apple-darwin", "never");

    lumea_release(tmp.path())
        .arg("collect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Collected 2 artifact(s), skipped 1"));

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("npm/win32-x64-msvc/core-x86_64-pc-windows-msvc.exe")).unwrap(),
        "MZ"
    );
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("npm/win32-x64-msvc/package.json")).unwrap(),
        "{\n    \"name\": \"@lumea/win32-x64-msvc\",\n    \"version\": \"1.2.0\",\n    \"files\": [\n        \"index.js\",\n        \"core-x86_64-pc-windows-msvc.exe\"\n    ]\n}\n"
    );
    assert!(tmp.path().join("npm/linux-arm64-musl/core-aarch64-unknown-linux-musl").exists());
    assert!(!tmp.path().join("npm/darwin-x64/core-x86_64-apple-darwin").exists());
}

#[test]
fn unmatched_triple_fails() {
    let tmp = tempfile::tempdir().unwrap();
    copy_fixture("npm", &tmp.path().join("npm"));
    write(tmp.path(), "artifacts/core-s390x-unknown-linux-gnu", "ELF");

    lumea_release(tmp.path())
        .args(["collect", "--artifacts", "artifacts", "--npm", "npm"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("linux-s390x-gnu"));
}

#[test]
fn types_are_wrapped_per_module() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "dist/api_main.d.ts", "export declare function quit(): void;");

    lumea_release(tmp.path())
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("types.d.ts created"));

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("dist/types.d.ts")).unwrap(),
        "declare module \"lumea/main\" {\nexport declare function quit(): void;\n}\n\n"
    );
    assert!(!tmp.path().join("dist/api_main.d.ts").exists());
}
