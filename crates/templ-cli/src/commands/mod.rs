// crates/templ-cli/src/commands/mod.rs
//
// Command module declarations for the Templ CLI.

pub mod exec;
pub mod init;
pub mod price;
pub mod show;
