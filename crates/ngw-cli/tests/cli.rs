use assert_cmd::Command;
use predicates::prelude::*;

fn ngw() -> Command {
    Command::cargo_bin("ngw").expect("ngw binary to be built")
}

#[test]
fn test_help_lists_commands() {
    ngw()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("layers"))
        .stdout(predicate::str::contains("query"));
}

#[test]
fn test_drivers_table() {
    ngw()
        .arg("drivers")
        .assert()
        .success()
        .stdout(predicate::str::contains("NextGIS Web"))
        .stdout(predicate::str::contains("Not Supported"));
}

#[test]
fn test_unrecognized_connection_fails() {
    ngw()
        .args(["layers", "https://demo.nextgis.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a NextGIS Web connection string"));
}

#[test]
fn test_invalid_endpoint_fails() {
    ngw()
        .args(["info", "NGW:http://", "--layer", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid NextGIS Web endpoint"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    ngw()
        .args(["--timeout", "0", "layers", "NGW:http://localhost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn test_dump_requires_layer() {
    ngw()
        .args(["dump", "NGW:http://localhost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--layer"));
}
