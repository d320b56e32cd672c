//! CLI command implementations

pub mod build;
pub mod detect;
pub mod resolve;

pub use build::execute as build;
pub use detect::execute as detect;
pub use resolve::execute as resolve;
