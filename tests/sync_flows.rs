use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    _tmp: TempDir,
    work: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let work = tmp.path().to_path_buf();
        Self { _tmp: tmp, work }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("odoosync").expect("binary builds");
        cmd.current_dir(&self.work);
        cmd
    }

    fn write_credentials(&self, host: &str) -> PathBuf {
        let path = self.work.join("credentials.json");
        fs::write(
            &path,
            serde_json::json!({
                "demo": {
                    "host_url": host,
                    "rest_api": "/api/v2",
                    "client_id": "id",
                    "client_secret": "secret"
                }
            })
            .to_string(),
        )
        .expect("write credentials");
        path
    }
}

#[test]
fn scaffold_writes_a_parsable_example_file() {
    let env = TestEnv::new();
    env.cmd()
        .arg("scaffold")
        .assert()
        .success()
        .stdout(contains("example_credentials.json"));

    let raw =
        fs::read_to_string(env.work.join("example_credentials.json")).expect("scaffold file");
    let parsed: Value = serde_json::from_str(&raw).expect("valid json");
    assert!(parsed.get("odoo-16_demo").is_some());
    assert!(parsed["odoo-16_demo"].get("client_id").is_some());
    assert!(parsed.get("odoo-13_demo").is_some());
}

#[test]
fn unknown_connection_fails_before_any_network_call() {
    let env = TestEnv::new();
    let creds = env.write_credentials("https://odoo.example.com");
    env.cmd()
        .args(["-c", creds.to_str().unwrap(), "list", "other"])
        .assert()
        .failure()
        .stderr(contains("could not find connection other"));
}

#[test]
fn broken_credentials_file_is_reported_as_such() {
    let env = TestEnv::new();
    let path = env.work.join("broken.json");
    fs::write(&path, "{ not json").expect("write broken file");
    env.cmd()
        .args(["-c", path.to_str().unwrap(), "list", "demo"])
        .assert()
        .failure()
        .stderr(contains("parsing credentials file"));
}

#[test]
fn unreachable_token_endpoint_aborts_the_operation() {
    let env = TestEnv::new();
    // discard port: the connection is refused before anything is sent
    let creds = env.write_credentials("http://127.0.0.1:9");
    env.cmd()
        .args(["-c", creds.to_str().unwrap(), "list", "demo"])
        .assert()
        .failure()
        .stderr(contains("token endpoint"));
}

#[test]
fn create_checks_the_connection_before_the_data_file() {
    let env = TestEnv::new();
    let creds = env.write_credentials("http://127.0.0.1:9");
    // the data file does not exist, but the connection failure comes first
    env.cmd()
        .args([
            "-c",
            creds.to_str().unwrap(),
            "create",
            "demo",
            "missing.json",
            "New Structure",
        ])
        .assert()
        .failure()
        .stderr(contains("token endpoint"));
}
