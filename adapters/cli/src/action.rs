use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Error, Result};
use butter_blast_core::CellCoord;

/// Player action supplied on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Swap two adjacent tiles: `swap:R,C:R,C`.
    Swap(CellCoord, CellCoord),
    /// Activate the special tile at a cell: `blast:R,C`.
    Blast(CellCoord),
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let mut parts = value.trim().split(':');
        let verb = parts.next().unwrap_or_default();
        let action = match verb.to_ascii_lowercase().as_str() {
            "swap" => {
                let a = parse_cell(parts.next())?;
                let b = parse_cell(parts.next())?;
                Self::Swap(a, b)
            }
            "blast" => Self::Blast(parse_cell(parts.next())?),
            other => bail!("unknown action '{other}', expected 'swap' or 'blast'"),
        };
        if parts.next().is_some() {
            bail!("trailing fields in action '{value}'");
        }
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swap(a, b) => write!(f, "swap {a} <-> {b}"),
            Self::Blast(center) => write!(f, "blast {center}"),
        }
    }
}

fn parse_cell(field: Option<&str>) -> Result<CellCoord> {
    let field = field.context("missing cell, expected ROW,COLUMN")?;
    let (row, column) = field
        .split_once(',')
        .with_context(|| format!("cell '{field}' must be written as ROW,COLUMN"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid row in cell '{field}'"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid column in cell '{field}'"))?;
    Ok(CellCoord::new(row, column))
}
