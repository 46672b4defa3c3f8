//! Property-based tests for filtering, dedupe and aggregation invariants.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use insiderwatch_core::aggregate::{build_summary, TOP_N};
use insiderwatch_core::data::RawInsiderTransaction;
use insiderwatch_core::transactions::{filter_records, lookback_cutoff, sort_and_dedupe};
use insiderwatch_core::{SymbolEntry, SymbolRegistry, Transaction, TransactionCode};
use proptest::prelude::*;
use std::collections::HashSet;

const SYMBOLS: [&str; 5] = ["AAPL", "MSFT", "XOM", "JPM", "ZZZZ"];

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn registry() -> SymbolRegistry {
    // ZZZZ is deliberately absent.
    SymbolRegistry::from_entries(vec![
        SymbolEntry::new("AAPL", "Apple", "Technology"),
        SymbolEntry::new("MSFT", "Microsoft", "Technology"),
        SymbolEntry::new("XOM", "ExxonMobil", "Energy"),
        SymbolEntry::new("JPM", "JPMorgan", "Financials"),
    ])
    .unwrap()
}

fn arb_raw() -> impl Strategy<Value = RawInsiderTransaction> {
    (
        prop::sample::select(vec!["P", "S", "p", "s", "M", "A", "G", ""]),
        0i64..400,
        -500.0f64..500.0,
        prop::option::of(0.0f64..1000.0),
        prop::sample::select(vec!["Alice", "Bob", "Carol"]),
    )
        .prop_map(|(code, days_ago, change, price, name)| {
            let date = now().date() - chrono::Duration::days(days_ago);
            RawInsiderTransaction {
                name: Some(name.to_string()),
                share: Some(1000.0),
                change: Some(change),
                filing_date: Some(date.to_string()),
                transaction_date: Some(date.to_string()),
                transaction_code: Some(code.to_string()),
                transaction_price: price,
            }
        })
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        prop::sample::select(SYMBOLS.to_vec()),
        prop::sample::select(vec!["Alice", "Bob", "Carol", "Dave"]),
        any::<bool>(),
        0.5f64..10_000.0,
        0.0f64..500.0,
        1u32..28,
    )
        .prop_map(|(sym, name, buy, shares, price, day)| Transaction {
            sym: sym.to_string(),
            name: name.to_string(),
            code: if buy {
                TransactionCode::Purchase
            } else {
                TransactionCode::Sale
            },
            change: if buy { shares } else { -shares },
            price,
            share: 0.0,
            tx_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            file_date: String::new(),
        })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 0.01 + 1e-9 * a.abs().max(b.abs())
}

proptest! {
    #[test]
    fn filtered_records_satisfy_policy(raws in prop::collection::vec(arb_raw(), 0..40)) {
        let cutoff = lookback_cutoff(now(), 180);
        for tx in filter_records("AAPL", &raws, cutoff) {
            prop_assert!(matches!(tx.code, TransactionCode::Purchase | TransactionCode::Sale));
            prop_assert!(tx.change != 0.0);
            prop_assert!(tx.tx_date.and_hms_opt(0, 0, 0).unwrap() >= cutoff);
            prop_assert_eq!(tx.sym.as_str(), "AAPL");
        }
    }

    #[test]
    fn dedupe_is_idempotent_and_sorted(txs in prop::collection::vec(arb_transaction(), 0..60)) {
        let once = sort_and_dedupe(txs);
        prop_assert!(once.windows(2).all(|w| w[0].tx_date >= w[1].tx_date));

        let distinct_keys = once.iter().map(|t| t.key()).collect::<HashSet<_>>().len();
        prop_assert_eq!(distinct_keys, once.len());

        let twice = sort_and_dedupe(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn dedupe_never_loses_a_key(txs in prop::collection::vec(arb_transaction(), 0..60)) {
        let before: HashSet<_> = txs.iter().map(|t| t.key()).collect();
        let deduped = sort_and_dedupe(txs.clone());
        let after: HashSet<_> = deduped.iter().map(|t| t.key()).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn summary_totals_agree(txs in prop::collection::vec(arb_transaction(), 0..60)) {
        let at = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let s = build_summary(&txs, &registry(), at);

        let buys: Vec<_> = txs.iter().filter(|t| t.is_purchase()).collect();
        prop_assert_eq!(s.buy_count, buys.len());
        prop_assert_eq!(s.sell_count, txs.len() - buys.len());

        let buy_val: f64 = buys.iter().map(|t| t.value()).sum();
        prop_assert!(close(s.buy_val, buy_val));

        let distinct: HashSet<_> = txs.iter().map(|t| t.sym.as_str()).collect();
        prop_assert_eq!(s.unique_symbols, distinct.len());

        // Sector totals cover exactly the registered symbols.
        let sector_sum: f64 = s.sectors.iter().map(|(_, v)| v.combined()).sum();
        let registered: f64 = txs.iter().filter(|t| t.sym != "ZZZZ").map(|t| t.value()).sum();
        prop_assert!(close(sector_sum, registered));
    }

    #[test]
    fn rankings_are_bounded_and_descending(txs in prop::collection::vec(arb_transaction(), 0..60)) {
        let at = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let s = build_summary(&txs, &registry(), at);

        for ranking in [&s.top_buy_stocks, &s.top_sell_stocks] {
            prop_assert!(ranking.len() <= TOP_N);
            prop_assert!(ranking.windows(2).all(|w| w[0].1.total >= w[1].1.total));
        }
        for ranking in [&s.top_buy_insiders, &s.top_sell_insiders] {
            prop_assert!(ranking.len() <= TOP_N);
            prop_assert!(ranking.windows(2).all(|w| w[0].1.total >= w[1].1.total));
            for (_, insider) in ranking.iter() {
                prop_assert!(insider.txs.len() <= TOP_N);
                prop_assert!(insider.txs.windows(2).all(|w| w[0].val >= w[1].val));
            }
        }
        prop_assert!(s.sectors.iter().all(|(name, _)| name != "ZZZZ"));
        prop_assert!(s.sectors.windows(2).all(|w| w[0].1.combined() >= w[1].1.combined()));
    }
}
