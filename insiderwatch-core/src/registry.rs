//! Symbol registry: the fixed universe of tickers with display names and sectors.
//!
//! The built-in registry is constructed once on first access and never
//! mutated. A custom universe can be loaded from a TOML file:
//!
//! ```toml
//! [[symbols]]
//! ticker = "AAPL"
//! name = "Apple"
//! sector = "Technology"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// A single ticker in the universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub ticker: String,
    pub name: String,
    pub sector: String,
}

impl SymbolEntry {
    pub fn new(ticker: &str, name: &str, sector: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate ticker in universe: {0}")]
    DuplicateTicker(String),

    #[error("universe entry with empty ticker")]
    EmptyTicker,
}

#[derive(Debug, Deserialize)]
struct UniverseFile {
    symbols: Vec<SymbolEntry>,
}

/// Immutable ticker → (name, sector) lookup, iterated in declaration order.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    entries: Vec<SymbolEntry>,
    index: HashMap<String, usize>,
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple", "Technology"),
    ("MSFT", "Microsoft", "Technology"),
    ("AMZN", "Amazon", "Consumer"),
    ("NVDA", "NVIDIA", "Technology"),
    ("GOOGL", "Alphabet", "Technology"),
    ("META", "Meta", "Technology"),
    ("TSLA", "Tesla", "Consumer"),
    ("JPM", "JPMorgan", "Financials"),
    ("V", "Visa", "Financials"),
    ("JNJ", "J&J", "Healthcare"),
    ("UNH", "UnitedHealth", "Healthcare"),
    ("XOM", "ExxonMobil", "Energy"),
    ("WMT", "Walmart", "Consumer"),
    ("MA", "Mastercard", "Financials"),
    ("PG", "P&G", "Consumer"),
    ("HD", "Home Depot", "Consumer"),
    ("CVX", "Chevron", "Energy"),
    ("MRK", "Merck", "Healthcare"),
    ("ABBV", "AbbVie", "Healthcare"),
    ("KO", "Coca-Cola", "Consumer"),
    ("PEP", "PepsiCo", "Consumer"),
    ("AVGO", "Broadcom", "Technology"),
    ("LLY", "Eli Lilly", "Healthcare"),
    ("COST", "Costco", "Consumer"),
    ("TMO", "Thermo Fisher", "Healthcare"),
    ("MCD", "McDonald's", "Consumer"),
    ("ABT", "Abbott", "Healthcare"),
    ("CSCO", "Cisco", "Technology"),
    ("ACN", "Accenture", "Technology"),
    ("NKE", "Nike", "Consumer"),
    ("NEE", "NextEra", "Utilities"),
    ("CRM", "Salesforce", "Technology"),
    ("LIN", "Linde", "Materials"),
    ("ORCL", "Oracle", "Technology"),
    ("AMD", "AMD", "Technology"),
    ("INTC", "Intel", "Technology"),
    ("BA", "Boeing", "Industrials"),
    ("RTX", "RTX", "Industrials"),
    ("CAT", "Caterpillar", "Industrials"),
    ("GE", "GE", "Industrials"),
    ("DE", "Deere", "Industrials"),
    ("UPS", "UPS", "Industrials"),
    ("GS", "Goldman Sachs", "Financials"),
    ("MS", "Morgan Stanley", "Financials"),
    ("BLK", "BlackRock", "Financials"),
    ("AXP", "Amex", "Financials"),
    ("SPGI", "S&P Global", "Financials"),
    ("DUK", "Duke Energy", "Utilities"),
    ("SO", "Southern Co", "Utilities"),
    ("AMT", "American Tower", "Real Estate"),
    ("PLD", "Prologis", "Real Estate"),
    ("COP", "ConocoPhillips", "Energy"),
    ("SLB", "Schlumberger", "Energy"),
    ("EOG", "EOG", "Energy"),
    ("APD", "Air Products", "Materials"),
    ("SHW", "Sherwin-Williams", "Materials"),
    ("ADBE", "Adobe", "Technology"),
    ("NOW", "ServiceNow", "Technology"),
    ("INTU", "Intuit", "Technology"),
    ("QCOM", "Qualcomm", "Technology"),
    ("ISRG", "Intuitive Surg.", "Healthcare"),
    ("GILD", "Gilead", "Healthcare"),
    ("AMGN", "Amgen", "Healthcare"),
    ("MDT", "Medtronic", "Healthcare"),
    ("PFE", "Pfizer", "Healthcare"),
    ("BMY", "Bristol-Myers", "Healthcare"),
    ("T", "AT&T", "Telecom"),
    ("VZ", "Verizon", "Telecom"),
    ("TMUS", "T-Mobile", "Telecom"),
    ("DIS", "Disney", "Consumer"),
    ("NFLX", "Netflix", "Consumer"),
    ("CMCSA", "Comcast", "Consumer"),
    ("PM", "Philip Morris", "Consumer"),
];

impl SymbolRegistry {
    /// Build a registry, rejecting empty or duplicate tickers.
    pub fn from_entries(entries: Vec<SymbolEntry>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.ticker.trim().is_empty() {
                return Err(RegistryError::EmptyTicker);
            }
            if index.insert(entry.ticker.clone(), i).is_some() {
                return Err(RegistryError::DuplicateTicker(entry.ticker.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The built-in large-cap universe. Built on first call.
    pub fn builtin() -> &'static SymbolRegistry {
        static REGISTRY: OnceLock<SymbolRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let entries: Vec<SymbolEntry> = BUILTIN
                .iter()
                .map(|(ticker, name, sector)| SymbolEntry::new(ticker, name, sector))
                .collect();
            // Uniqueness of the table is checked by `builtin_tickers_are_unique`.
            let index = entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.ticker.clone(), i))
                .collect();
            Self { entries, index }
        })
    }

    /// Parse a registry from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        let file: UniverseFile = toml::from_str(content)?;
        Self::from_entries(file.symbols)
    }

    /// Load a registry from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn get(&self, ticker: &str) -> Option<&SymbolEntry> {
        self.index.get(ticker).map(|&i| &self.entries[i])
    }

    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.get(ticker).map(|e| e.sector.as_str())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.index.contains_key(ticker)
    }

    /// Tickers in declaration order.
    pub fn tickers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.ticker.as_str()).collect()
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// Distinct sector names in first-seen order.
    pub fn sector_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.sector.as_str()) {
                names.push(&entry.sector);
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tickers_are_unique() {
        let entries = BUILTIN
            .iter()
            .map(|(t, n, s)| SymbolEntry::new(t, n, s))
            .collect();
        assert!(SymbolRegistry::from_entries(entries).is_ok());
    }

    #[test]
    fn builtin_has_full_universe() {
        let r = SymbolRegistry::builtin();
        assert_eq!(r.len(), 73);
        assert_eq!(r.tickers()[0], "AAPL");
        assert_eq!(r.tickers()[72], "PM");
    }

    #[test]
    fn sector_lookup() {
        let r = SymbolRegistry::builtin();
        assert_eq!(r.sector_of("JPM"), Some("Financials"));
        assert_eq!(r.sector_of("PLD"), Some("Real Estate"));
        assert_eq!(r.get("T").map(|e| e.name.as_str()), Some("AT&T"));
        assert_eq!(r.sector_of("ZZZZ"), None);
    }

    #[test]
    fn sector_names_are_distinct() {
        let r = SymbolRegistry::builtin();
        let names = r.sector_names();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Technology");
        assert!(names.contains(&"Telecom"));
    }

    #[test]
    fn toml_universe_parses() {
        let toml_str = r#"
[[symbols]]
ticker = "SPY"
name = "S&P 500 ETF"
sector = "ETFs"

[[symbols]]
ticker = "QQQ"
name = "Nasdaq 100 ETF"
sector = "ETFs"
"#;
        let r = SymbolRegistry::from_toml(toml_str).unwrap();
        assert_eq!(r.tickers(), vec!["SPY", "QQQ"]);
        assert_eq!(r.sector_of("QQQ"), Some("ETFs"));
    }

    #[test]
    fn duplicate_ticker_rejected() {
        let entries = vec![
            SymbolEntry::new("AAPL", "Apple", "Technology"),
            SymbolEntry::new("AAPL", "Apple again", "Technology"),
        ];
        let err = SymbolRegistry::from_entries(entries).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTicker(t) if t == "AAPL"));
    }

    #[test]
    fn empty_ticker_rejected() {
        let entries = vec![SymbolEntry::new(" ", "Blank", "None")];
        assert!(matches!(
            SymbolRegistry::from_entries(entries),
            Err(RegistryError::EmptyTicker)
        ));
    }
}
