//! Core types for Dirlookup

mod entry;
mod user;

pub use entry::*;
pub use user::*;
