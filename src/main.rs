use std::env;

use anyhow::{Context, Result};
use cep_form::{
    AddressRecord, AppConfig, Field, FileStorage, FormController, LocalStore, LogNotifier,
    LookupReport, ViaCepClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cep_form=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <cep> [number]", args[0]);
        eprintln!("       {} clear", args[0]);
        eprintln!("  cep: 8 digits, punctuation ignored (e.g., 01310-930)");
        eprintln!("  number: optional house number to store with the address");
        std::process::exit(1);
    }

    let config = AppConfig::from_env();
    let lookup = ViaCepClient::with_base_url(&config.lookup_base_url)
        .context("Failed to build lookup client")?;
    let store = LocalStore::with_key(
        FileStorage::new(config.storage_dir.clone()),
        config.storage_key.clone(),
    );
    let form = FormController::new(store, lookup, LogNotifier);

    if args[1] == "clear" {
        form.on_clear().await;
        println!("Saved form cleared.");
        return Ok(());
    }

    // Same order as a page visit: restore first, then type
    form.on_load().await;

    let report = form.on_input(Field::PostalCode, &args[1]).await;
    if let Some(number) = args.get(2) {
        form.on_input(Field::Number, number).await;
    }

    match report {
        LookupReport::Skipped => eprintln!("CEP incomplete, lookup skipped"),
        LookupReport::Failed => eprintln!("Lookup failed, address fields unchanged"),
        _ => {}
    }

    print_form(&form.snapshot().await);
    Ok(())
}

fn print_form(record: &AddressRecord) {
    for field in Field::ALL {
        let value = record.get(field);
        println!(
            "  {:<12} {}",
            field.id(),
            if value.is_empty() { "-" } else { value }
        );
    }
}
