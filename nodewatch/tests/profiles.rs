//! Profile persistence through the CLI (non-interactive paths only). Each
//! test gets its own XDG config dir, so nothing touches the real one.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

fn profiles_path(cfg: &Path) -> PathBuf {
    cfg.join("nodewatch").join("profiles.json")
}

fn run_nodewatch(cfg: &Path, args: &[&str]) -> (bool, String) {
    let out = Command::cargo_bin("nodewatch")
        .unwrap()
        .env("XDG_CONFIG_HOME", cfg)
        .env("TMPDIR", cfg)
        .args(args)
        .output()
        .unwrap();
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    (out.status.success(), text)
}

#[test]
fn profile_created_on_first_use() {
    let td = tempfile::tempdir().unwrap();
    let (ok, out) = run_nodewatch(td.path(), &["--profile", "unittest", "http://example:1", "--dry-run"]);
    assert!(ok, "{out}");
    let data = fs::read_to_string(profiles_path(td.path())).expect("profiles.json created");
    assert!(data.contains("unittest"), "profiles.json missing profile entry: {data}");
    assert!(data.contains("http://example:1"));
}

#[test]
fn profile_overwrite_only_when_changed() {
    let td = tempfile::tempdir().unwrap();
    run_nodewatch(td.path(), &["--profile", "prod", "http://one", "--dry-run"]);
    let first = fs::read_to_string(profiles_path(td.path())).unwrap();

    run_nodewatch(td.path(), &["--profile", "prod", "http://one", "--dry-run"]);
    let second = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert_eq!(first, second, "Profile file changed despite identical input");

    // Overwrite with a different URL using --save (no prompt path)
    run_nodewatch(td.path(), &["--profile", "prod", "--save", "http://two", "--dry-run"]);
    let third = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(third.contains("two"), "Updated URL not written: {third}");
}

#[test]
fn changed_profile_without_save_is_kept_when_prompt_declined() {
    let td = tempfile::tempdir().unwrap();
    run_nodewatch(td.path(), &["--profile", "prod", "http://one", "--dry-run"]);
    // stdin is empty, so the overwrite prompt reads "no"
    let (ok, out) = run_nodewatch(td.path(), &["--profile", "prod", "http://two", "--dry-run"]);
    assert!(ok, "{out}");
    assert!(out.contains("Overwrite existing profile 'prod'?"));
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("http://one") && !data.contains("http://two"), "{data}");
}

#[test]
fn profile_tls_ca_persisted() {
    let td = tempfile::tempdir().unwrap();
    run_nodewatch(
        td.path(),
        &["--profile", "secureX", "--tls-ca", "/tmp/cert.pem", "https://host", "--dry-run"],
    );
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("secureX"));
    assert!(data.contains("cert.pem"));
}

#[test]
fn saved_profile_loads_by_name() {
    let td = tempfile::tempdir().unwrap();
    run_nodewatch(td.path(), &["-P", "lab", "http://lab.internal:9000", "--dry-run"]);
    let (ok, out) = run_nodewatch(td.path(), &["-P", "lab", "--dry-run"]);
    assert!(ok, "{out}");
    assert!(out.contains("target http://lab.internal:9000"), "{out}");
}

#[test]
fn poll_section_survives_profile_updates() {
    let td = tempfile::tempdir().unwrap();
    let path = profiles_path(td.path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, r#"{"profiles":{},"poll":{"logs_ms":9000},"version":0}"#).unwrap();

    run_nodewatch(td.path(), &["-P", "new", "http://n", "--dry-run"]);
    let data = fs::read_to_string(&path).unwrap();
    assert!(data.contains("\"new\""), "{data}");
    assert!(data.contains("9000"), "poll overrides lost: {data}");
}
