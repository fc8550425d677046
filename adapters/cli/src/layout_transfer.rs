use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use butter_blast_core::{Grid, GRID_COLUMNS, GRID_ROWS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "spud";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "spud:v1";

/// Board captured as a single line: `spud:v1:<columns>x<rows>:<base64 json>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BoardSnapshot {
    /// Board captured by the snapshot.
    pub grid: Grid,
}

impl BoardSnapshot {
    /// Encodes the snapshot for pasting into `play --layout`.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("board snapshot serialization never fails");
        format!(
            "{SNAPSHOT_HEADER}:{GRID_COLUMNS}x{GRID_ROWS}:{}",
            STANDARD_NO_PAD.encode(json)
        )
    }

    /// Decodes a string produced by [`BoardSnapshot::encode`].
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(LayoutTransferError::Empty);
        }

        let fields: Vec<&str> = value.splitn(4, ':').collect();
        let [domain, version, size, payload] = fields[..] else {
            return Err(LayoutTransferError::MissingFields {
                found: fields.len(),
            });
        };
        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) =
            board_size(size).ok_or_else(|| LayoutTransferError::InvalidDimensions(size.to_owned()))?;
        if (columns, rows) != (GRID_COLUMNS, GRID_ROWS) {
            return Err(LayoutTransferError::UnsupportedDimensions { columns, rows });
        }

        let json = STANDARD_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Reasons a layout string cannot be turned back into a board.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The string was empty or whitespace.
    #[error("layout string was empty")]
    Empty,
    /// Fewer than the four `:`-separated fields were present.
    #[error("layout string has {found} of 4 fields")]
    MissingFields {
        /// Number of fields found.
        found: usize,
    },
    /// The first field was not `spud`.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version field was not `v1`.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The size field was not `<columns>x<rows>`.
    #[error("could not parse board size '{0}'")]
    InvalidDimensions(String),
    /// The size field named a board other than 8×8.
    #[error("layout is {columns}x{rows} but the board is 8x8")]
    UnsupportedDimensions {
        /// Columns declared by the snapshot.
        columns: u32,
        /// Rows declared by the snapshot.
        rows: u32,
    },
    /// The payload was not base64.
    #[error("could not decode layout payload")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The payload was not a serialized board.
    #[error("could not parse layout payload")]
    InvalidPayload(#[from] serde_json::Error),
}

fn board_size(size: &str) -> Option<(u32, u32)> {
    let (columns, rows) = size.split_once(['x', 'X'])?;
    Some((columns.trim().parse().ok()?, rows.trim().parse().ok()?))
}
