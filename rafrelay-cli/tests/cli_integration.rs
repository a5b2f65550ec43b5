// rafrelay-cli/tests/cli_integration.rs
//
// Runs the compiled binary against fake external tools.

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn rafrelay_cmd() -> Command {
    let mut cmd = Command::cargo_bin("rafrelay").expect("Failed to find rafrelay binary");
    for var in [
        "RAFRELAY_CJXL",
        "RAFRELAY_AVIFENC",
        "RAFRELAY_EXIFTOOL",
        "RAFRELAY_TOOLS_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("#!/bin/sh\n{body}"))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

/// Bundled tool layout whose encoders copy their input to the output.
#[cfg(unix)]
fn fake_tools(dir: &Path) -> std::io::Result<()> {
    let encoder = r#"if [ "$1" = "--version" ]; then echo "fake encoder 1.0"; exit 0; fi
cp "$1" "$2"
"#;
    write_script(&dir.join("cjxl/cjxl"), encoder)?;
    write_script(&dir.join("libavif/avifenc"), encoder)?;
    write_script(
        &dir.join("exiftool/exiftool"),
        r#"if [ "$1" = "-ver" ]; then echo "13.10"; exit 0; fi
exit 0
"#,
    )
}

#[test]
fn test_help_lists_subcommands() -> Result<(), Box<dyn Error>> {
    rafrelay_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("convert").and(contains("check")));
    Ok(())
}

#[test]
fn test_invalid_quality_rejected() -> Result<(), Box<dyn Error>> {
    rafrelay_cmd()
        .args(["convert", "--quality", "0"])
        .assert()
        .failure()
        .stderr(contains("quality"));
    Ok(())
}

#[test]
fn test_check_without_tools_fails() -> Result<(), Box<dyn Error>> {
    let tools = tempdir()?;
    rafrelay_cmd()
        .args(["check", "--tools-dir"])
        .arg(tools.path())
        .assert()
        .code(1)
        .stdout(contains("ERROR").and(contains("not found")));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_check_with_bundled_tools() -> Result<(), Box<dyn Error>> {
    let tools = tempdir()?;
    fake_tools(tools.path())?;

    rafrelay_cmd()
        .args(["check", "--tools-dir"])
        .arg(tools.path())
        .assert()
        .success()
        .stdout(
            contains("cjxl")
                .and(contains("avifenc"))
                .and(contains("13.10"))
                .and(contains("ERROR").not()),
        );
    Ok(())
}

#[test]
fn test_convert_missing_encoder_is_fatal() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    let input = root.path().join("in");
    fs::create_dir_all(&input)?;
    fs::write(input.join("a.RAF"), b"raw")?;
    let output = root.path().join("out");

    rafrelay_cmd()
        .args(["convert", "--tools-dir"])
        .arg(root.path().join("no-tools"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(contains("Required tools are not usable"));

    assert!(!output.exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_convert_missing_input_dir_is_fatal() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    fake_tools(&root.path().join("tools"))?;

    rafrelay_cmd()
        .args(["convert", "--tools-dir"])
        .arg(root.path().join("tools"))
        .arg("-i")
        .arg(root.path().join("missing"))
        .arg("-o")
        .arg(root.path().join("out"))
        .assert()
        .code(1)
        .stderr(contains("Directory error"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_convert_reports_per_file_failures() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    fake_tools(&root.path().join("tools"))?;
    let input = root.path().join("in");
    let output = root.path().join("out");
    fs::create_dir_all(&input)?;
    fs::create_dir_all(&output)?;
    // Not a RAW file: decoding fails for this one only.
    fs::write(input.join("broken.RAF"), b"definitely not a raw file")?;
    // Already converted: skipped without decoding.
    fs::write(input.join("done.RAF"), b"raw")?;
    fs::write(output.join("done.jxl"), b"earlier output")?;

    rafrelay_cmd()
        .args(["convert", "--tools-dir"])
        .arg(root.path().join("tools"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .code(2)
        .stdout(
            contains("broken.RAF failed at decode")
                .and(contains("done.RAF skipped: output already exists"))
                .and(contains("SUMMARY")),
        );

    assert!(!output.join("broken.jxl").exists());
    assert_eq!(fs::read(output.join("done.jxl"))?, b"earlier output");
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_convert_json_events() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    fake_tools(&root.path().join("tools"))?;
    let input = root.path().join("in");
    let output = root.path().join("out");
    fs::create_dir_all(&input)?;
    fs::create_dir_all(&output)?;
    fs::write(input.join("a.RAF"), b"raw")?;
    fs::write(output.join("a.jxl"), b"earlier output")?;

    let assert = rafrelay_cmd()
        .args(["convert", "--json", "--tools-dir"])
        .arg(root.path().join("tools"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let types: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line)?;
            Ok(value["type"].as_str().unwrap_or_default().to_string())
        })
        .collect::<Result<_, serde_json::Error>>()?;
    assert_eq!(
        types,
        vec!["batch_started", "file_started", "file_finished", "batch_finished"]
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_convert_writes_run_log() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    fake_tools(&root.path().join("tools"))?;
    let input = root.path().join("in");
    fs::create_dir_all(&input)?;
    let logs = root.path().join("logs");

    rafrelay_cmd()
        .args(["convert", "--tools-dir"])
        .arg(root.path().join("tools"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(root.path().join("out"))
        .arg("--log-dir")
        .arg(&logs)
        .assert()
        .success()
        .stdout(contains("Log file"));

    let names: Vec<String> = fs::read_dir(&logs)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("rafrelay_run_") && names[0].ends_with(".log"));

    let contents = fs::read_to_string(logs.join(&names[0]))?;
    assert!(contents.contains("Found 0 RAW file(s)"));
    Ok(())
}
