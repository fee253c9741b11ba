//! Chatmux is a terminal chat client for talking to multiple AI providers
//! through one interface.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the provider catalog, the credential store (the single
//!   owner of the persisted configuration), and the dispatch client that
//!   normalizes every backend call into one result type.
//! - [`api`] implements the per-provider adapters behind a single trait;
//!   adding a backend means one adapter plus one catalog entry.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop; network work happens in spawned tasks reported over a channel.
//! - [`cli`] parses command-line arguments and implements the provider and
//!   model listing subcommands.
//!
//! The binary entrypoint (`src/main.rs`) routes subcommands into [`cli`]
//! and interactive sessions into [`ui::chat_loop`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
