//! toolbox - Run self-describing modules by dotted name
//!
//! Facade over [`toolbox_core`]; the command-line front end lives in the
//! `toolbox-cli` crate.

pub use toolbox_core::*;
