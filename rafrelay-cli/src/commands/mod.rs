//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `convert` command.
/// This command converts every RAW file of a directory to JPEG XL or AVIF.
pub mod convert;

/// Module containing the implementation of the `check` command.
pub mod check;
