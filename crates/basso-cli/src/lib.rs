//! Shared pieces of the basso binaries

pub mod output;
