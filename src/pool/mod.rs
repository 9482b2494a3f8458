//! Transaction pool: the record model and the source boundary that
//! produces the initial pool.

pub mod record;
pub mod source;

pub use record::{ConfirmationStatus, TxInput, TxOutput, TxRecord};
pub use source::{PoolSource, SourceError, SyntheticPoolSource};
