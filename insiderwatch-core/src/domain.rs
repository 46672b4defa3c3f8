//! Normalized insider transaction records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Open-market transaction codes kept by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionCode {
    #[serde(rename = "P")]
    Purchase,
    #[serde(rename = "S")]
    Sale,
}

impl TransactionCode {
    /// Parse a provider code, case-insensitive. Anything but P/S is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "P" => Some(Self::Purchase),
            "S" => Some(Self::Sale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "P",
            Self::Sale => "S",
        }
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One insider trade, as persisted to `insider.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sym: String,
    pub name: String,
    pub code: TransactionCode,
    /// Signed share delta as reported, fractional shares included; never zero.
    pub change: f64,
    pub price: f64,
    /// Shares held after the transaction.
    pub share: f64,
    /// Effective date: transaction date, or filing date when absent.
    #[serde(rename = "txDate")]
    pub tx_date: NaiveDate,
    /// Raw filing date as reported; may be empty.
    #[serde(rename = "fileDate")]
    pub file_date: String,
}

/// Deduplication identity: (name, date, change, symbol). The change is kept
/// as its bit pattern so the key can be hashed.
pub type TransactionKey<'a> = (&'a str, NaiveDate, u64, &'a str);

impl Transaction {
    /// Dollar value of the trade, `|change × price|`.
    pub fn value(&self) -> f64 {
        (self.change * self.price).abs()
    }

    pub fn key(&self) -> TransactionKey<'_> {
        (&self.name, self.tx_date, self.change.to_bits(), &self.sym)
    }

    pub fn is_purchase(&self) -> bool {
        self.code == TransactionCode::Purchase
    }
}
