use borelog_core::error::BorelogError;
use borelog_core::model::ExtractionResult;
use std::path::Path;

pub fn print(result: &ExtractionResult) -> Result<(), BorelogError> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

pub fn write(result: &ExtractionResult, path: &Path) -> Result<(), BorelogError> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}
