use std::error::Error;

use crate::core::providers::ProviderRegistry;

pub fn list_models(
    registry: &ProviderRegistry,
    provider: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    match provider {
        Some(id) => {
            let provider = registry
                .get(id)
                .ok_or_else(|| format!("unknown provider '{id}' (try `chatmux providers`)"))?;
            print_models(&provider.display_name, &provider.models);
        }
        None => {
            for provider in registry.list() {
                print_models(&provider.display_name, &provider.models);
            }
        }
    }
    Ok(())
}

fn print_models(display_name: &str, models: &[String]) {
    println!("{display_name}:");
    for model in models {
        println!("  {model}");
    }
}
