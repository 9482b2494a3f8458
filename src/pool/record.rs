//! The immutable transaction record model.
//!
//! Records are created once by a [`PoolSource`](crate::pool::source::PoolSource)
//! and never mutated afterwards; the engine only ever holds read access to
//! them. The `txid` is the one stable handle used by selection state.

use serde::{Deserialize, Serialize};

/// A candidate transaction as seen by the selection engine.
///
/// `vsize` and `fee_rate` are derived at construction time and then treated
/// as stored attributes: sorting and filtering read them directly instead of
/// recomputing `fee / vsize` on every comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Hex transaction id; the only stable identifier.
    pub txid: String,
    /// Absolute fee in sats.
    pub fee: u64,
    /// Virtual size in vbytes; always `ceil(weight / 4)`.
    pub vsize: u64,
    /// Weight units.
    pub weight: u64,
    /// `fee / vsize`, rounded to 2 decimal places at construction.
    pub fee_rate: f64,
    /// First-seen time, epoch milliseconds.
    pub timestamp: i64,
    pub status: ConfirmationStatus,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
}

impl TxRecord {
    /// Builds a record from raw fields, deriving `vsize` and `fee_rate`.
    ///
    /// `weight` must be positive; `vsize` is `ceil(weight / 4)` and the fee
    /// rate is rounded to 2 decimals once, here, never again.
    pub fn new(
        txid: String,
        fee: u64,
        weight: u64,
        timestamp: i64,
        status: ConfirmationStatus,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
    ) -> Self {
        debug_assert!(weight > 0, "transaction weight must be positive");
        let vsize = weight.div_ceil(4);
        let fee_rate = round2(fee as f64 / vsize as f64);
        Self {
            txid,
            fee,
            vsize,
            weight,
            fee_rate,
            timestamp,
            status,
            inputs,
            outputs,
        }
    }
}

/// Round to 2 decimal places, matching how the fee rate is presented.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Confirmation state of a record.
///
/// Serialized in the upstream feed shape (`{confirmed, block_height,
/// block_time}`) so records can be ingested from an esplora-style JSON
/// source unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StatusWire", into = "StatusWire")]
pub enum ConfirmationStatus {
    Unconfirmed,
    Confirmed { block_height: u32, block_time: i64 },
}

impl ConfirmationStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationStatus::Confirmed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatusWire {
    confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_time: Option<i64>,
}

impl From<StatusWire> for ConfirmationStatus {
    fn from(w: StatusWire) -> Self {
        match (w.confirmed, w.block_height, w.block_time) {
            (true, Some(block_height), Some(block_time)) => ConfirmationStatus::Confirmed {
                block_height,
                block_time,
            },
            _ => ConfirmationStatus::Unconfirmed,
        }
    }
}

impl From<ConfirmationStatus> for StatusWire {
    fn from(s: ConfirmationStatus) -> Self {
        match s {
            ConfirmationStatus::Unconfirmed => StatusWire {
                confirmed: false,
                block_height: None,
                block_time: None,
            },
            ConfirmationStatus::Confirmed {
                block_height,
                block_time,
            } => StatusWire {
                confirmed: true,
                block_height: Some(block_height),
                block_time: Some(block_time),
            },
        }
    }
}

/// An input spending a previous output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    /// Txid of the funding transaction.
    pub txid: String,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// The output being spent, when the feed provides it.
    #[serde(default)]
    pub prevout: Option<TxOutput>,
    pub sequence: u32,
}

/// An output created by a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub scriptpubkey: String,
    pub scriptpubkey_type: String,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    /// Output value in sats.
    pub value: u64,
}
