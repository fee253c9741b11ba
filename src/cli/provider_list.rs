use crate::core::credentials::CredentialStore;
use crate::core::providers::ProviderRegistry;

pub fn list_providers(registry: &ProviderRegistry, store: &CredentialStore) {
    println!("Available providers:");
    for provider in registry.list() {
        let key_status = if !provider.requires_api_key {
            "no key needed"
        } else if store.is_configured(&provider.id) {
            "key saved"
        } else {
            "no key saved"
        };
        println!(
            "  {:<12} {} ({} models, {})",
            provider.id,
            provider.display_name,
            provider.models.len(),
            key_status
        );
    }
    println!();
    println!("Keys are stored in {}", store.path().display());
}
