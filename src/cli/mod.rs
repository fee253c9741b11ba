//! Command-line interface parsing and the listing subcommands.

pub mod model_list;
pub mod provider_list;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatmux")]
#[command(about = "A terminal chat client for multiple AI providers")]
#[command(
    long_about = "Chatmux is a full-screen terminal chat client that sends single-turn \
messages to OpenAI, Claude, Gemini, or Perplexity through one interface.\n\n\
API keys are stored per provider in ~/.chatmux/config.json; save one from \
inside the app with Ctrl+K.\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Ctrl+P / Ctrl+N   Cycle provider / model\n\
  Ctrl+K            Enter an API key for the selected provider\n\
  PageUp/PageDown   Scroll the conversation\n\
  Ctrl+C            Clear the conversation\n\
  Ctrl+Q            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider to start with (see `chatmux providers`)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model to start with
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append tracing output to this file (filtered by RUST_LOG)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the built-in providers and whether a key is saved for each
    Providers,
    /// List the models offered by one provider, or by all of them
    Models {
        /// Provider id to list models for
        provider: Option<String>,
    },
}
