// End-to-end tests for the `idmatch` binary: exit codes, stdout contract,
// and a full run against a mock registry and a seeded SQLite file.
//
// Run with: cargo test -p idmatch-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;
use idmatch_recon::UsState;
use idmatch_store::{DemographicRow, SqliteDemographicStore};

fn idmatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_idmatch"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("IDMATCH_CONFIG")
        .env_remove("IDMATCH_REGISTRY_TOKEN")
        .env("RUST_LOG", "warn");
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn row(id: &str, first: &str, last: &str, city: &str) -> DemographicRow {
    DemographicRow {
        individualid: id.into(),
        firstname: first.into(),
        lastname: last.into(),
        gender: Some("F".into()),
        birthdate: None,
        city: Some(city.into()),
        state: Some("IL".into()),
        zip: None,
    }
}

/// IL table with one Jane Doe and two Ann Lees.
fn seed_database(dir: &Path) -> PathBuf {
    let path = dir.join("infousa.sqlite");
    let il = UsState::parse("IL").unwrap();
    let store = SqliteDemographicStore::new(rusqlite::Connection::open(&path).unwrap()).unwrap();
    store.create_state_table(il).unwrap();
    store.insert(il, &row("IL-1", "Jane", "Doe", "Springfield")).unwrap();
    store.insert(il, &row("IL-2", "Ann", "Lee", "Chicago")).unwrap();
    store.insert(il, &row("IL-3", "Ann", "Lee", "Peoria")).unwrap();
    path
}

fn write_config(dir: &Path, db: &Path, api_base: &str, extra: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        "[database]\npath = {db:?}\n\n[registry]\napi_base = {api_base:?}\ntoken = \"t0k\"\n{extra}\n",
        db = db.display().to_string(),
    );
    std::fs::write(&path, body).unwrap();
    path
}

// ===========================================================================
// idmatch config check
// ===========================================================================

#[test]
fn config_check_missing_file_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = idmatch()
        .args(["config", "check", "--config"])
        .arg(dir.path().join("absent.toml"))
        .output()
        .expect("idmatch config check");

    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn config_check_invalid_attempts_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        Path::new("db.sqlite"),
        "http://registry.test",
        "\n[policy]\nsubmit_attempts = 9",
    );
    let output = idmatch()
        .args(["config", "check", "--config"])
        .arg(&config)
        .output()
        .expect("idmatch config check");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("policy.submit_attempts"));
}

#[test]
fn config_check_token_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"database": {"path": "db.sqlite"}}"#).unwrap();

    let without = idmatch()
        .args(["config", "check", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(without.status.code(), Some(2));
    assert!(stderr(&without).contains("IDMATCH_REGISTRY_TOKEN"));

    let with = idmatch()
        .args(["config", "check", "--config"])
        .arg(&config)
        .env("IDMATCH_REGISTRY_TOKEN", "from-env")
        .output()
        .unwrap();
    assert!(with.status.success(), "stderr: {}", stderr(&with));
    assert!(!stderr(&with).contains("from-env"), "token must not be printed");
}

// ===========================================================================
// idmatch lookup
// ===========================================================================

#[test]
fn lookup_unknown_state_exits_63() {
    let output = idmatch()
        .args(["lookup", "--given", "Jane", "--family", "Doe", "--state", "ZZ"])
        .args(["--database", "unused.sqlite"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(63), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("ZZ"));
}

#[test]
fn lookup_non_latin1_name_exits_63() {
    let output = idmatch()
        .args(["lookup", "--given", "Зоя", "--family", "Doe", "--state", "IL"])
        .args(["--database", "unused.sqlite"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(63));
}

#[test]
fn lookup_missing_database_exits_61() {
    let dir = tempfile::tempdir().unwrap();
    let output = idmatch()
        .args(["lookup", "--given", "Jane", "--family", "Doe", "--state", "IL", "--database"])
        .arg(dir.path().join("absent.sqlite"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(61));
}

#[test]
fn lookup_prints_single_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed_database(dir.path());

    let exact = idmatch()
        .args(["lookup", "--given", "jane", "--family", "DOE", "--state", "il", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    assert!(exact.status.success(), "stderr: {}", stderr(&exact));
    let report: serde_json::Value = serde_json::from_slice(&exact.stdout).unwrap();
    assert_eq!(report["outcome"], "exact match");
    assert_eq!(report["matched"]["external_id"], "IL-1");
    assert_eq!(report["demographics"]["gender"], "female");

    let ambiguous = idmatch()
        .args(["lookup", "--given", "Ann", "--family", "Lee", "--state", "IL", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&ambiguous.stdout).unwrap();
    assert_eq!(report["outcome"], "ambiguous match");
    assert!(report.get("matched").is_none());
    assert!(report.get("demographics").is_none());

    // City narrows the two Ann Lees to one.
    let narrowed = idmatch()
        .args(["lookup", "--given", "Ann", "--family", "Lee", "--state", "IL", "--city", "peoria", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&narrowed.stdout).unwrap();
    assert_eq!(report["outcome"], "exact match");
    assert_eq!(report["matched"]["external_id"], "IL-3");
}

// ===========================================================================
// idmatch run
// ===========================================================================

#[test]
fn run_submits_one_report_per_person() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed_database(dir.path());
    let server = MockServer::start();

    let page1 = server.mock(|when, then| {
        when.method(GET)
            .path("/persons")
            .query_param("offset", "1")
            .header("Authorization", "Token token=\"t0k\"");
        then.status(200).json_body(serde_json::json!({
            "persons": [
                {"id": 1, "name": "Jane Doe", "location": {"state": "IL"}},
                {"id": 2, "name": "John Roe", "location": {"state": "IL"}},
                {"id": 3, "name": "Ann Lee", "location": {"state": "IL"}},
                {"id": 4, "name": "Cher", "location": {"state": "IL"}},
                {"id": 5, "name": "Tex Ritter", "location": {"state": "TX"}}
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/persons").query_param("offset", "101");
        then.status(200).json_body(serde_json::json!({ "persons": [] }));
    });

    let found = server.mock(|when, then| {
        when.method(PATCH).path("/persons/1").json_body(serde_json::json!({
            "person": {
                "status": "found",
                "external_id": "IL-1",
                "name": "Jane Doe",
                "gender": "female",
                "location": {"city": "Springfield", "state": "IL"}
            }
        }));
        then.status(200);
    });
    let missing = server.mock(|when, then| {
        when.method(PATCH)
            .path("/persons/2")
            .json_body(serde_json::json!({"person": {"status": "missing"}}));
        then.status(200);
    });
    let ambiguous = server.mock(|when, then| {
        when.method(PATCH)
            .path("/persons/3")
            .json_body(serde_json::json!({"person": {"status": "ambiguous"}}));
        then.status(200);
    });
    let failed = server.mock(|when, then| {
        when.method(PATCH)
            .path("/persons/4")
            .json_body(serde_json::json!({"person": {"status": "failed"}}));
        then.status(200);
    });
    // TX has no table: the lookup fails, is skipped, and nothing is sent.
    let skipped = server.mock(|when, then| {
        when.method(PATCH).path("/persons/5");
        then.status(200);
    });

    let config = write_config(dir.path(), &db, &server.base_url(), "");
    let output = idmatch()
        .args(["run", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    page1.assert();
    found.assert();
    missing.assert();
    ambiguous.assert();
    failed.assert();
    skipped.assert_calls(0);

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["fetched"], 5);
    assert_eq!(summary["exact"], 1);
    assert_eq!(summary["no_match"], 1);
    assert_eq!(summary["ambiguous"], 1);
    assert_eq!(summary["unresolvable"], 1);
    assert_eq!(summary["lookup_failures"], 1);
    assert_eq!(summary["submitted"], 4);
}

#[test]
fn run_dry_run_submits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed_database(dir.path());
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/persons").query_param("offset", "1");
        then.status(200).json_body(serde_json::json!({
            "persons": [{"id": 1, "name": "Jane Doe", "location": {"state": "IL"}}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/persons").query_param("offset", "101");
        then.status(200).json_body(serde_json::json!({ "persons": [] }));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH);
        then.status(200);
    });

    let config = write_config(dir.path(), &db, &server.base_url(), "");
    let output = idmatch()
        .args(["run", "--dry-run", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "no --json, no stdout");
    assert!(stderr(&output).contains("dry run"));
    patch.assert_calls(0);
}

#[test]
fn run_fetch_failure_exits_60_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed_database(dir.path());
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/persons");
        then.status(503).body("maintenance");
    });

    let config = write_config(dir.path(), &db, &server.base_url(), "");
    let output = idmatch()
        .args(["run", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(60), "stderr: {}", stderr(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["fetched"], 0);
    assert!(stderr(&output).contains("503"));
}

#[test]
fn run_submit_halt_policy_exits_62() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed_database(dir.path());
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/persons").query_param("offset", "1");
        then.status(200).json_body(serde_json::json!({
            "persons": [{"id": 9, "name": "Jane Doe", "location": {"state": "IL"}}]
        }));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/persons/9");
        then.status(500).body("boom");
    });

    let config = write_config(
        dir.path(),
        &db,
        &server.base_url(),
        "\n[policy]\non_submit_failure = \"halt\"\nsubmit_attempts = 2",
    );
    let output = idmatch()
        .args(["run", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(62), "stderr: {}", stderr(&output));
    patch.assert_calls(2);
    assert!(stderr(&output).contains("person 9"));
}

#[test]
fn run_missing_database_exits_61_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/persons");
        then.status(200).json_body(serde_json::json!({ "persons": [] }));
    });

    let config = write_config(dir.path(), &dir.path().join("absent.sqlite"), &server.base_url(), "");
    let output = idmatch()
        .args(["run", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(61));
    list.assert_calls(0);
}
