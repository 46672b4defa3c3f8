//! Summary aggregation over the deduplicated transaction set.
//!
//! `build_summary` is pure: same transactions, registry and timestamp give the
//! same `Summary`. Every ranking is a stable descending sort, so ties keep
//! first-encounter order.
//!
//! Rankings serialize as `[key, stats]` pairs, which is the shape the
//! dashboard reads.

use crate::domain::Transaction;
use crate::registry::SymbolRegistry;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Length of every top-N list in the summary.
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTotals {
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub sym: String,
    pub date: NaiveDate,
    pub val: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTotals {
    pub total: f64,
    /// First symbol this insider was seen trading.
    pub sym: String,
    /// Largest individual trades, at most `TOP_N`.
    pub txs: Vec<InsiderTrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTotals {
    pub buys: f64,
    pub sells: f64,
}

impl SectorTotals {
    pub fn combined(&self) -> f64 {
        self.buys + self.sells
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// UTC time of computation, `%Y-%m-%dT%H:%M:%SZ`.
    pub updated: String,
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_val: f64,
    pub sell_val: f64,
    pub unique_symbols: usize,
    pub top_buy_stocks: Vec<(String, StockTotals)>,
    pub top_sell_stocks: Vec<(String, StockTotals)>,
    pub top_buy_insiders: Vec<(String, InsiderTotals)>,
    pub top_sell_insiders: Vec<(String, InsiderTotals)>,
    pub sectors: Vec<(String, SectorTotals)>,
}

/// Insertion-ordered accumulator keyed by string.
struct Tally<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Tally<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn entry(&mut self, key: &str, init: impl FnOnce() -> T) -> &mut T {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.entries.push((key.to_string(), init()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// All entries, stable-sorted descending by `metric`.
    fn ranked_by(self, metric: impl Fn(&T) -> f64) -> Vec<(String, T)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| metric(&b.1).total_cmp(&metric(&a.1)));
        entries
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn top_stocks(tally: Tally<StockTotals>) -> Vec<(String, StockTotals)> {
    let mut ranked = tally.ranked_by(|s| s.total);
    ranked.truncate(TOP_N);
    ranked
}

fn top_insiders(tally: Tally<InsiderTotals>) -> Vec<(String, InsiderTotals)> {
    let mut ranked = tally.ranked_by(|i| i.total);
    ranked.truncate(TOP_N);
    for (_, insider) in &mut ranked {
        insider.txs.sort_by(|a, b| b.val.total_cmp(&a.val));
        insider.txs.truncate(TOP_N);
    }
    ranked
}

/// Compute the summary for a deduplicated transaction set.
///
/// Transactions on symbols the registry does not know still count toward the
/// global totals and rankings but are left out of the sector rollup.
pub fn build_summary(
    transactions: &[Transaction],
    registry: &SymbolRegistry,
    generated_at: DateTime<Utc>,
) -> Summary {
    let mut buy_count = 0;
    let mut sell_count = 0;
    let mut buy_val = 0.0;
    let mut sell_val = 0.0;

    let mut buy_stocks: Tally<StockTotals> = Tally::new();
    let mut sell_stocks: Tally<StockTotals> = Tally::new();
    let mut buy_insiders: Tally<InsiderTotals> = Tally::new();
    let mut sell_insiders: Tally<InsiderTotals> = Tally::new();
    let mut sectors: Tally<SectorTotals> = Tally::new();
    let mut symbols: HashSet<&str> = HashSet::new();

    for tx in transactions {
        let val = tx.value();
        let is_buy = tx.is_purchase();

        symbols.insert(&tx.sym);

        if is_buy {
            buy_count += 1;
            buy_val += val;
        } else {
            sell_count += 1;
            sell_val += val;
        }

        let (stocks, insiders) = if is_buy {
            (&mut buy_stocks, &mut buy_insiders)
        } else {
            (&mut sell_stocks, &mut sell_insiders)
        };

        let stock = stocks.entry(&tx.sym, || StockTotals {
            total: 0.0,
            count: 0,
        });
        stock.total += val;
        stock.count += 1;

        // Every insider accumulates unconditionally, buyers included.
        let insider = insiders.entry(&tx.name, || InsiderTotals {
            total: 0.0,
            sym: tx.sym.clone(),
            txs: Vec::new(),
        });
        insider.total += val;
        insider.txs.push(InsiderTrade {
            sym: tx.sym.clone(),
            date: tx.tx_date,
            val,
        });

        if let Some(sector) = registry.sector_of(&tx.sym) {
            let totals = sectors.entry(sector, || SectorTotals {
                buys: 0.0,
                sells: 0.0,
            });
            if is_buy {
                totals.buys += val;
            } else {
                totals.sells += val;
            }
        }
    }

    Summary {
        updated: generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        buy_count,
        sell_count,
        buy_val: round2(buy_val),
        sell_val: round2(sell_val),
        unique_symbols: symbols.len(),
        top_buy_stocks: top_stocks(buy_stocks),
        top_sell_stocks: top_stocks(sell_stocks),
        top_buy_insiders: top_insiders(buy_insiders),
        top_sell_insiders: top_insiders(sell_insiders),
        sectors: sectors.ranked_by(SectorTotals::combined),
    }
}
