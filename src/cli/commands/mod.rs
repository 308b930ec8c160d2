//! One module per `lockbox` subcommand.

pub mod add;
pub mod backup;
pub mod categories;
pub mod common;
pub mod completions;
pub mod delete;
pub mod export;
pub mod get;
pub mod group;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod move_cmd;
pub mod restore;
pub mod rotate;
pub mod tags;
pub mod update;
