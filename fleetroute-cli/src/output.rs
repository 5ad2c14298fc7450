//! Output formats shared by the subcommands.

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// One pretty-printed JSON document.
    Json,
    /// One compact JSON object per table row.
    Rows,
}

/// Write `text` verbatim.
pub(crate) fn write_text(writer: &mut dyn Write, text: &str) -> Result<(), CliError> {
    writer
        .write_all(text.as_bytes())
        .map_err(CliError::WriteOutput)
}

/// Serialise `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    write_text(writer, &payload)?;
    write_text(writer, "\n")
}

/// Serialise each row as compact JSON on its own line.
pub(crate) fn write_rows<T: Serialize>(writer: &mut dyn Write, rows: &[T]) -> Result<(), CliError> {
    for row in rows {
        let line = serde_json::to_string(row).map_err(CliError::SerialiseOutput)?;
        write_text(writer, &line)?;
        write_text(writer, "\n")?;
    }
    Ok(())
}
