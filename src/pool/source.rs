//! Pool source boundary.
//!
//! A [`PoolSource`] is a one-shot asynchronous provider of the initial
//! transaction pool. In production this would sit on a mempool feed; here the
//! default implementation is a synthetic generator so the engine can be
//! exercised without any network I/O.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;

use crate::pool::record::{ConfirmationStatus, TxInput, TxOutput, TxRecord};

/// Failure surfaced by a pool source. Not retried automatically; the caller
/// decides whether to fetch again.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("pool source unavailable: {0}")]
    Unavailable(String),
    #[error("pool source returned malformed records: {0}")]
    Malformed(String),
}

/// One-shot provider of an ordered sequence of transaction records.
///
/// The fetch is a single bounded call, not a stream; no cancellation support
/// is required.
#[async_trait]
pub trait PoolSource {
    async fn fetch(&self) -> Result<Vec<TxRecord>, SourceError>;
}

/// Generates a randomized pool of plausible-looking transactions.
///
/// Shapes match a typical esplora feed: 64-hex txids, p2pkh-style scripts,
/// weights up to 2000 WU, fees in the 1k..501k sat range, timestamps within
/// the past 24 hours, roughly 80% confirmed. A fixed `seed` makes the pool
/// reproducible for tests and benchmarks.
pub struct SyntheticPoolSource {
    count: usize,
    seed: Option<u64>,
}

impl SyntheticPoolSource {
    pub fn new(count: usize) -> Self {
        Self { count, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn generate(&self, now_ms: i64) -> Vec<TxRecord> {
        let mut rng = self.rng();
        let mut pool = Vec::with_capacity(self.count);

        for _ in 0..self.count {
            let txid = random_hex(&mut rng, 32);
            let weight = rng.gen_range(1..=2000u64);
            let fee = rng.gen_range(1000..501_000u64);
            let timestamp = now_ms - rng.gen_range(0..24 * 60 * 60 * 1000i64);

            let status = if rng.gen_bool(0.8) {
                ConfirmationStatus::Confirmed {
                    block_height: 824_000 + rng.gen_range(0..500),
                    block_time: timestamp,
                }
            } else {
                ConfirmationStatus::Unconfirmed
            };

            let inputs = (0..rng.gen_range(1..=5))
                .map(|_| TxInput {
                    txid: random_hex(&mut rng, 32),
                    vout: rng.gen_range(0..10),
                    prevout: Some(random_output(&mut rng)),
                    sequence: u32::MAX,
                })
                .collect();

            let outputs = (0..rng.gen_range(1..=3))
                .map(|_| random_output(&mut rng))
                .collect();

            pool.push(TxRecord::new(
                txid, fee, weight, timestamp, status, inputs, outputs,
            ));
        }

        pool
    }
}

#[async_trait]
impl PoolSource for SyntheticPoolSource {
    async fn fetch(&self) -> Result<Vec<TxRecord>, SourceError> {
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| SourceError::Unavailable(e.to_string()))?
            .as_millis() as i64;

        log::info!("[SOURCE] generating {} synthetic transactions", self.count);
        Ok(self.generate(now_ms))
    }
}

fn random_hex(rng: &mut StdRng, bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    hex::encode(buf)
}

fn random_output(rng: &mut StdRng) -> TxOutput {
    let hash160 = random_hex(rng, 20);
    TxOutput {
        scriptpubkey: format!("76a914{hash160}88ac"),
        scriptpubkey_type: "p2pkh".to_string(),
        scriptpubkey_address: Some(format!("1{}", &random_hex(rng, 17)[..33])),
        value: rng.gen_range(10_000..1_010_000),
    }
}
