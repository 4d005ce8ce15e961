//! `superzip` commands.
//!
//! `package` builds a bundle; `boot` runs one when the executable itself
//! carries a bundle.

pub mod boot;
pub mod package;
