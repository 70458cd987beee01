//! Subcommand handlers for the `mini-ca` binary.

pub mod new;

pub use new::{handle_new, CertType, NewArgs};
