// src/commands/mod.rs
//! Command handlers for the wgtpack CLI

mod pack;

pub use pack::{cmd_pack, report_collision};
