use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use chatmux::cli::{model_list, provider_list, Args, Commands};
use chatmux::core::credentials::CredentialStore;
use chatmux::core::dispatch::{DispatchClient, DispatchService};
use chatmux::core::providers::ProviderRegistry;
use chatmux::ui::app::App;
use chatmux::ui::chat_loop::run_chat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let registry = ProviderRegistry::builtin();
    let store = CredentialStore::load_default();

    match args.command {
        Some(Commands::Providers) => {
            provider_list::list_providers(&registry, &store);
            Ok(())
        }
        Some(Commands::Models { provider }) => model_list::list_models(&registry, provider.as_deref()),
        None => {
            let client = Arc::new(DispatchClient::new(registry));
            let (service, rx) = DispatchService::new();
            let app = App::new(
                client,
                store,
                service,
                args.provider.as_deref(),
                args.model.as_deref(),
            )?;
            run_chat(app, rx).await
        }
    }
}

/// Tracing goes to a file only: the TUI owns the terminal, so logging is
/// disabled unless `--log-file` is given.
fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
