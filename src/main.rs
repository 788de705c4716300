// Small dev utility: extract one or more rent roll files and print the results as JSON.
//
// Usage:
//   cargo run --bin rent-roll-extract -- <file> [file ...]
//
// Configuration comes from <config_dir>/rent-roll/config.json (if present) and the
// RENT_ROLL_SYNONYMS / RENT_ROLL_LOCALE / RENT_ROLL_SINGLE_SHEET environment variables.

use anyhow::{bail, Context};
use rent_roll_extractor::config::ExtractorConfig;
use rent_roll_extractor::importer::{RentRollImporter, RentRollImporterImpl};
use rent_roll_extractor::{i18n, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: rent-roll-extract <file> [file ...]");
    }

    let mut config = ExtractorConfig::load(None).context("loading extractor config")?;
    config
        .apply_env_overrides()
        .context("applying environment overrides")?;
    i18n::set_locale(&config.locale);

    tracing::info!(
        version = rent_roll_extractor::VERSION,
        files = paths.len(),
        "{}",
        rent_roll_extractor::APP_NAME
    );

    let importer = RentRollImporterImpl::new(&config).context("building importer")?;
    let results = importer.batch_import(paths).await;

    let output: Vec<serde_json::Value> = results
        .into_iter()
        .map(|r| match r {
            Ok(result) => serde_json::to_value(result),
            Err(message) => Ok(serde_json::json!({ "success": false, "message": message })),
        })
        .collect::<Result<Vec<_>, _>>()
        .context("serializing results")?;

    let rendered = if output.len() == 1 {
        serde_json::to_string_pretty(&output[0])?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
