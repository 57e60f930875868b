#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use httpmock::Method::{DELETE, GET, POST};
use httpmock::MockServer;
use predicates::str::contains;
use std::fs;
use std::net::TcpListener;
use tempfile::TempDir;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn mock_version(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/core-service/v1/api-version");
        then.status(200)
            .json_body(serde_json::json!({ "version": "10.1" }));
    })
}

fn mock_batches(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/core-service/v1/lists/batches");
        then.status(200).json_body(serde_json::json!([
            {
                "id": "tcm:0-1-66048",
                "title": "Finished",
                "total_number_of_operations": 4,
                "number_of_done_operations": 4
            },
            {
                "id": "tcm:0-2-66048",
                "title": "Running",
                "total_number_of_operations": 4,
                "number_of_done_operations": 1
            }
        ]));
    });
}

/// Command pointed at the mock server with an isolated config location.
fn cmsweepctl(server: &MockServer, temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cmsweepctl").unwrap();
    cmd.arg("--server")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(server.port().to_string())
        .arg("--client-config")
        .arg(temp.path().join("client.toml"))
        .env_remove("CMSWEEP_HOST")
        .env_remove("CMSWEEP_PORT");
    cmd
}

#[test]
fn forced_batch_purge_deletes_completed_only() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    mock_batches(&server);
    let finished = server.mock(|when, then| {
        when.method(DELETE).path("/core-service/v1/items/tcm:0-1-66048");
        then.status(204);
    });
    let running = server.mock(|when, then| {
        when.method(DELETE).path("/core-service/v1/items/tcm:0-2-66048");
        then.status(204);
    });

    let temp = TempDir::new().unwrap();
    cmsweepctl(&server, &temp)
        .args(["purge", "batches", "--force"])
        .assert()
        .success()
        .stdout(contains("Only completed TCM batches"))
        .stdout(contains("Purged: tcm:0-1-66048 (Finished)"))
        .stdout(contains("Done! 1 purged, 0 failed."));

    finished.assert();
    assert_eq!(running.hits(), 0);
}

#[test]
fn declined_prompt_deletes_nothing() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    mock_batches(&server);
    let delete = server.mock(|when, then| {
        when.method(DELETE).path_contains("/core-service/v1/items/");
        then.status(204);
    });

    let temp = TempDir::new().unwrap();
    cmsweepctl(&server, &temp)
        .args(["purge", "batches", "--all"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(contains("All TCM batches"))
        .stdout(contains("Purge cancelled."));

    assert_eq!(delete.hits(), 0);
}

#[test]
fn invalid_criteria_fail_before_contacting_service() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let version = mock_version(&server);

    let temp = TempDir::new().unwrap();
    cmsweepctl(&server, &temp)
        .args(["purge", "old-versions", "--force"])
        .assert()
        .failure()
        .stderr(contains("publication or organizational item is required"));

    assert_eq!(version.hits(), 0);
}

#[test]
fn item_failure_is_reported_and_exit_code_nonzero() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/core-service/v1/publication-targets/tcm:0-3-65537/decommission");
        then.status(204);
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/core-service/v1/publication-targets/tcm:0-4-65537/decommission");
        then.status(500).json_body(serde_json::json!({
            "error_code": "ItemDoesNotExist",
            "message": "Target tcm:0-4-65537 does not exist"
        }));
    });

    let temp = TempDir::new().unwrap();
    cmsweepctl(&server, &temp)
        .args(["decommission", "tcm:0-3-65537", "tcm:0-4-65537", "--force"])
        .assert()
        .failure()
        .stdout(contains("Purged: tcm:0-3-65537"))
        .stdout(contains("Failed: tcm:0-4-65537"))
        .stderr(contains("1 of 2 artifacts could not be purged"));
}

#[test]
fn json_output_for_queue_purge() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    let purge = server.mock(|when, then| {
        when.method(POST).path("/core-service/v1/queues/3/purge");
        then.status(204);
    });

    let temp = TempDir::new().unwrap();
    let output = cmsweepctl(&server, &temp)
        .args(["purge", "queues", "search", "--force", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"], "Messages in queues: search");
    assert_eq!(value["deleted"][0]["kind"], "queue");
    assert_eq!(value["deleted"][0]["id"], "SearchQueue");
    assert_eq!(value["cancelled"], false);
    purge.assert();
}

#[test]
fn version_reads_server_from_config_file() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let version = mock_version(&server);

    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("client.toml");
    fs::write(
        &config_path,
        format!("host = \"127.0.0.1\"\nport = {}\n", server.port()),
    )
    .unwrap();

    Command::cargo_bin("cmsweepctl")
        .unwrap()
        .arg("version")
        .arg("--client-config")
        .arg(&config_path)
        .env_remove("CMSWEEP_HOST")
        .env_remove("CMSWEEP_PORT")
        .assert()
        .success()
        .stdout(contains("Core service API version 10.1"));

    version.assert();
}

#[test]
fn unreachable_service_is_a_connectivity_error() {
    let temp = TempDir::new().unwrap();
    let port = TcpListener::bind("127.0.0.1:0")
        .map(|listener| listener.local_addr().unwrap().port())
        .unwrap_or(9);

    Command::cargo_bin("cmsweepctl")
        .unwrap()
        .args(["version", "--server", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .arg("--client-config")
        .arg(temp.path().join("client.toml"))
        .assert()
        .failure()
        .stderr(contains("cannot connect to core service"));
}

#[test]
fn purge_requires_subcommand() {
    Command::cargo_bin("cmsweepctl")
        .unwrap()
        .arg("purge")
        .assert()
        .failure()
        .stderr(contains("Usage"));
}

fn mock_undo_package_listing(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/core-service/v1/application-data");
        then.status(200).json_body(serde_json::json!([
            {
                "application_id": "UndoPackage_A",
                "data": "dW5kbyBwYWNrYWdlIGJ5dGVz"
            },
            {
                "application_id": "UndoPackageMetadata_UndoPackage_A",
                "data": "MDEtMDEtMjAyNC0xMC0zMC0wMHx0Y206MC0xLTY1NTUyfFVuZG9QYWNrYWdlX0F8NHxpbXBvcnRlZCBVbmRvUGFja2FnZV9B"
            }
        ]));
    });
}

#[test]
fn failed_export_keeps_existing_file() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    mock_undo_package_listing(&server);

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("package.bin");
    fs::write(&target, "existing bytes").unwrap();

    cmsweepctl(&server, &temp)
        .args(["export-undo-package", "UndoPackage_missing", "-o"])
        .arg(&target)
        .assert()
        .failure()
        .stderr(contains("no undo package UndoPackage_missing"));

    assert_eq!(fs::read(&target).unwrap(), b"existing bytes");
    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".partial-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn export_replaces_file_with_package_content() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    mock_version(&server);
    mock_undo_package_listing(&server);
    let download = server.mock(|when, then| {
        when.method(GET)
            .path("/stream-download/v1/application-data/UndoPackage_A");
        then.status(200).body("undo package bytes");
    });

    let temp = TempDir::new().unwrap();
    let target = temp.path().join("package.bin");
    fs::write(&target, "older export").unwrap();

    cmsweepctl(&server, &temp)
        .args(["export-undo-package", "UndoPackage_A", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stdout(contains("(18 bytes)"));

    download.assert();
    assert_eq!(fs::read(&target).unwrap(), b"undo package bytes");
}
