use assert_cmd::Command;

fn shelf() -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", std::env::temp_dir().join("shelf-cli-no-config"));
    cmd
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_book_commands() {
    let output = shelf().args(["books", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["list", "show", "add", "update", "delete"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn add_reports_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let output = shelf()
        .args(["books", "add", "--file"])
        .arg(&missing)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("failed to read"));
}

#[test]
fn update_rejects_non_object_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("book.json");
    std::fs::write(&file, "[1, 2, 3]").unwrap();

    let output = shelf()
        .args(["books", "update", "0191f2a8-7c4e-7d2a-9a55-3f6d1f1c2b10", "--file"])
        .arg(&file)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("is not a JSON book object"));
}

#[test]
fn unreachable_server_is_reported_as_network_error() {
    let output = shelf()
        .args(["--base-url", "http://127.0.0.1:9/api", "books", "list"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Network error"));
}
