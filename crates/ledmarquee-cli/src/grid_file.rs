//! Plain-text pixel grids.
//!
//! One row per line, values in `[0, 1]` separated by whitespace. Blank lines
//! and lines starting with `#` are skipped.

use std::path::Path;

use ledmarquee_core::PixelGrid;

use crate::error::CliError;

/// Read a grid file.
pub async fn load(path: &Path) -> Result<PixelGrid, CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::GridRead { path: path.to_path_buf(), source })?;
    parse(&text)
}

/// Parse grid text.
pub fn parse(text: &str) -> Result<PixelGrid, CliError> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f32>()
                    .map(|v| v.clamp(0.0, 1.0))
                    .map_err(|_| CliError::GridParse { line: index + 1, token: token.to_owned() })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        rows.push(row);
    }
    Ok(PixelGrid::from_rows(rows)?)
}
