use std::str::FromStr;

use wordgrid_core::board::Grid;
use wordgrid_core::error::WordgridErrorKind;
use wordgrid_core::WordgridResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = wordgrid_core::error::WordgridError;
    fn from_str(s: &str) -> Result<Format, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            _ => Err(WordgridErrorKind::Args
                .with_error(anyhow::anyhow!("invalid output format: {}", s))),
        }
    }
}

fn grid_rows(grid: &Grid) -> Vec<String> {
    (0..grid.rows())
        .map(|r| {
            grid.row_symbols(r)
                .iter()
                .map(|&s| s as char)
                .collect::<String>()
        })
        .collect()
}

/// Grid rows with letters separated by a single space.
pub fn format_text(grid: &Grid) -> String {
    let mut lines = Vec::with_capacity(grid.rows());
    for r in 0..grid.rows() {
        let symbols: Vec<String> = grid
            .row_symbols(r)
            .iter()
            .map(|&s| (s as char).to_string())
            .collect();
        lines.push(symbols.join(" "));
    }
    lines.join("\n")
}

/// JSON array of row strings.
pub fn format_json(grid: &Grid) -> WordgridResult<String> {
    serde_json::to_string(&grid_rows(grid))
        .map_err(|err| WordgridErrorKind::Serialize.with_error(anyhow::anyhow!(err)))
}

pub fn format(grid: &Grid, output_format: Format) -> WordgridResult<String> {
    match output_format {
        Format::Text => Ok(format_text(grid)),
        Format::Json => format_json(grid),
    }
}
