/// Tests that drive the compiled binary
use std::process::Command;
use tempfile::TempDir;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_python-ast-rag"))
}

#[test]
fn test_long_version_carries_build_metadata() {
    let output = binary().arg("--version").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains("built "));
    assert!(stdout.contains(" UTC)"));
}

#[test]
fn test_extract_json() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("shapes.py");
    std::fs::write(
        &file,
        "class Square:\n    def area(self):\n        return square(self.side)\n    # TODO: perimeter\n",
    )
    .unwrap();

    let output = binary().arg("extract").arg(&file).arg("--json").output().unwrap();
    assert!(output.status.success());

    let chunks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1]["metadata"]["name"], "area");
    assert_eq!(chunks[1]["metadata"]["parent_name"], "Square");
    assert_eq!(chunks[1]["metadata"]["line_range"]["end"], 3);
}
