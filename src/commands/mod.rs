//! Command implementations for vend CLI

pub mod link;
pub mod sync;
pub mod version;
