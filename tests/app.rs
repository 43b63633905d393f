use assert_cmd::Command;

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn unreachable_server_exits_non_zero_without_output() {
    let config_dir = tempfile::tempdir().unwrap();
    let port = closed_port();

    let output = Command::cargo_bin("dbcheck-app")
        .unwrap()
        .env("DBCHECK_CONFIG_DIR", config_dir.path())
        .env_remove("DBCHECK_ENV")
        .env("DBCHECK__DATABASE__HOST", "127.0.0.1")
        .env("DBCHECK__DATABASE__PORT", port.to_string())
        .env("DBCHECK__DATABASE__CONNECT_TIMEOUT_SECS", "2")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap();

    assert!(!output.status.success(), "{:?}", output);
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains(&format!("failed to connect to 127.0.0.1:{port}")),
        "{stderr}"
    );
}

#[test]
fn invalid_environment_exits_non_zero() {
    let config_dir = tempfile::tempdir().unwrap();

    let output = Command::cargo_bin("dbcheck-app")
        .unwrap()
        .env("DBCHECK_CONFIG_DIR", config_dir.path())
        .env("DBCHECK_ENV", "qa")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported environment 'qa'"));
}
