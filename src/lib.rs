//! Pipeline orchestrator for semantic matching of tree-shaped contexts.
//!
//! A [`manager::MatchManager`] is resolved from configuration for every command;
//! [`dispatch`] validates the command line and runs one stage recipe against it.
pub mod cli;
pub mod components;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod manager;
pub mod output;
pub mod registry;
pub mod wordnet;

#[cfg(test)]
mod test_support;
