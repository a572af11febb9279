use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::trade::TradeRecord;

/// Current trade log file format version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk layout of a trade log:
///
/// ```json
/// { "version": 1, "trades": [ { "date": "21/03/2019", "action": "BUY", ... } ] }
/// ```
///
/// Files without a `version` key are treated as version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogFile {
    #[serde(default = "current_version")]
    pub version: u16,
    pub trades: Vec<TradeRecord>,
}

fn current_version() -> u16 {
    CURRENT_VERSION
}

/// Serialize records into the pretty-printed JSON file contents.
pub fn write_file(records: &[TradeRecord]) -> Result<Vec<u8>, CoreError> {
    let file = TradeLogFile {
        version: CURRENT_VERSION,
        trades: records.to_vec(),
    };
    serde_json::to_vec_pretty(&file)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize trade log: {e}")))
}

/// Parse file contents and return the records in file order.
///
/// Problems with the file as a whole (empty, not JSON, no `trades` array)
/// are `InvalidFileFormat`; a record with a missing or mistyped key is a
/// `ValidationError`, the same as for [`crate::models::trade::Trade::from_value`].
pub fn read_file(data: &[u8]) -> Result<Vec<TradeRecord>, CoreError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(CoreError::InvalidFileFormat("Trade log file is empty".into()));
    }

    let file: RawTradeLogFile = serde_json::from_slice(data).map_err(|e| {
        CoreError::InvalidFileFormat(format!("Not a valid trade log: {e}"))
    })?;

    if file.version == 0 || file.version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(file.version));
    }

    file.trades
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| {
                CoreError::ValidationError(format!(
                    "Trade record {} not well formatted: {e}",
                    index + 1
                ))
            })
        })
        .collect()
}

/// File layout with records left untyped until the header has been checked.
#[derive(Deserialize)]
struct RawTradeLogFile {
    #[serde(default = "current_version")]
    version: u16,
    trades: Vec<serde_json::Value>,
}
