pub mod policies;
pub mod preview;
pub mod topology;

use serde::Serialize;
use tp_engine::{Engine, OutputFormat};

/// Print `value` as pretty JSON when the engine is configured for JSON
/// output. Returns false when the caller should render a table instead.
pub fn print_json_if_requested<T: Serialize>(engine: &Engine, value: &T) -> anyhow::Result<bool> {
    if engine.config().format != OutputFormat::Json {
        return Ok(false);
    }
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(true)
}
