use borelog_core::config::ExtractionConfig;
use borelog_core::error::BorelogError;

/// Print the default configuration, a starting point for `--config` files.
pub fn print_default() -> Result<(), BorelogError> {
    let json = serde_json::to_string_pretty(&ExtractionConfig::default())?;
    println!("{json}");
    Ok(())
}
