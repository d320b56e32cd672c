//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use std::ffi::OsString;
use std::path::Path;

/// Insert the subcommand implied by the executable name.
///
/// The lifecycle runs `bin/detect` and `bin/build`; both are links to this
/// executable, so `detect <platform> <plan>` becomes
/// `nginx-cnb detect <platform> <plan>`.
pub fn lifecycle_args(mut args: Vec<OsString>) -> Vec<OsString> {
    let phase = args
        .first()
        .and_then(|a| Path::new(a).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| matches!(*n, "detect" | "build"))
        .map(OsString::from);

    if let Some(phase) = phase {
        args.insert(1, phase);
    }
    args
}
