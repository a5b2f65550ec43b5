// rafrelay-core/tests/tools_tests.rs
//
// Tool resolution and liveness checks against real processes (fake tools
// written as shell scripts).

#![cfg(unix)]

mod common;

use common::{fake_encoder, fake_exiftool, hanging_encoder, write_script};
use rafrelay_core::config::{CoreConfigBuilder, ToolPaths};
use rafrelay_core::external::{StdProcessRunner, ToolKind, ToolStatus, ToolTable, check_tool, resolve_tool};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_bundled_layout_resolves_and_checks() -> Result<(), Box<dyn std::error::Error>> {
    let tools_dir = tempdir()?;
    fake_encoder(&ToolKind::Cjxl.default_path(tools_dir.path()), "JPEG XL encoder v0.11.1")?;
    fake_encoder(&ToolKind::Avifenc.default_path(tools_dir.path()), "Version: 1.1.1")?;
    fake_exiftool(&ToolKind::Exiftool.default_path(tools_dir.path()), true)?;

    let table = ToolTable::resolve_all(&ToolPaths::default(), tools_dir.path());
    assert!(table.iter().all(|spec| spec.status == ToolStatus::Unchecked));

    let checked = table.check_all(&StdProcessRunner, TIMEOUT);
    assert!(checked.all_ok());
    assert_eq!(checked.cjxl.message, "JPEG XL encoder v0.11.1");
    assert_eq!(checked.exiftool.message, "13.10");
    assert!(
        checked
            .avifenc
            .resolved_path
            .as_ref()
            .unwrap()
            .starts_with(tools_dir.path().join("libavif"))
    );

    // Checking returns a new table; the original is untouched.
    assert_eq!(table.cjxl.status, ToolStatus::Unchecked);
    Ok(())
}

#[test]
fn test_configured_paths_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let custom = fake_encoder(&dir.path().join("bin").join("my-avifenc"), "avifenc 1.0")?;

    let config = CoreConfigBuilder::new()
        .tools_dir(dir.path().join("nowhere"))
        .tool_path(ToolKind::Avifenc, custom.clone())
        .build();
    let table = ToolTable::from_config(&config);

    assert_eq!(table.avifenc.resolved_path.as_deref(), Some(custom.as_path()));
    assert_eq!(table.cjxl.status, ToolStatus::Error);
    assert_eq!(table.exiftool.status, ToolStatus::Error);
    Ok(())
}

#[test]
fn test_encoder_check_includes_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_script(
        &dir.path().join("cjxl"),
        "echo 'cjxl v0.10.2'\necho 'Copyright (c) the JPEG XL Project' >&2\n",
    )?;

    let spec = resolve_tool(ToolKind::Cjxl, Some(&path), dir.path());
    let checked = check_tool(&StdProcessRunner, &spec, TIMEOUT);
    assert_eq!(checked.status, ToolStatus::Ok);
    assert_eq!(
        checked.message,
        "cjxl v0.10.2 | Copyright (c) the JPEG XL Project"
    );
    Ok(())
}

#[test]
fn test_non_zero_exit_is_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = write_script(&dir.path().join("exiftool"), "echo 'broken perl' >&2\nexit 2\n")?;

    let spec = resolve_tool(ToolKind::Exiftool, Some(&path), dir.path());
    let checked = check_tool(&StdProcessRunner, &spec, TIMEOUT);
    assert_eq!(checked.status, ToolStatus::Error);
    assert!(checked.message.starts_with("Error calling '"));
    assert!(checked.message.ends_with("-ver': broken perl"));
    Ok(())
}

#[test]
fn test_not_executable_is_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("cjxl");
    fs::write(&path, "not a program")?;

    let spec = resolve_tool(ToolKind::Cjxl, Some(&path), dir.path());
    assert_eq!(spec.status, ToolStatus::Unchecked);
    let checked = check_tool(&StdProcessRunner, &spec, TIMEOUT);
    assert_eq!(checked.status, ToolStatus::Error);
    assert!(checked.message.contains("not executable"), "{}", checked.message);
    Ok(())
}

#[test]
fn test_hanging_check_times_out() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    // Hangs on every invocation, including the version query.
    let path = write_script(&dir.path().join("avifenc"), "exec sleep 30\n")?;

    let spec = resolve_tool(ToolKind::Avifenc, Some(&path), dir.path());
    let checked = check_tool(&StdProcessRunner, &spec, Duration::from_millis(300));
    assert_eq!(checked.status, ToolStatus::Error);
    assert!(checked.message.contains("timed out"), "{}", checked.message);
    Ok(())
}

#[test]
fn test_missing_tool_is_never_spawned() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    hanging_encoder(&dir.path().join("unrelated"))?;

    let spec = resolve_tool(ToolKind::Cjxl, None, dir.path());
    assert!(spec.resolved_path.is_none());
    let checked = check_tool(&StdProcessRunner, &spec, TIMEOUT);
    assert_eq!(checked.status, ToolStatus::Error);
    assert!(checked.message.contains("not found"));
    Ok(())
}
