use std::collections::HashMap;

use super::holding::Holding;
use super::price::PriceMap;
use super::trade::Trade;

/// The portfolio state container.
///
/// `trade_log` is the only source of truth; `cash_available` and `holdings`
/// are derived from it by `PortfolioService::recompute_from_log`.
/// `last_price_snapshot` survives recomputes so that re-derived holdings keep
/// their last known price.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    /// Ordered trade log, oldest first (insertion order)
    pub trade_log: Vec<Trade>,

    /// Running signed cash total
    pub cash_available: f64,

    /// Symbol → current position (only symbols with a positive quantity)
    pub holdings: HashMap<String, Holding>,

    /// Every live price received so far, latest per symbol
    pub last_price_snapshot: PriceMap,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols currently held, sorted alphabetically.
    pub fn held_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.holdings.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Holdings sorted by symbol for deterministic display.
    pub fn holding_list(&self) -> Vec<&Holding> {
        let mut list: Vec<&Holding> = self.holdings.values().collect();
        list.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        list
    }
}
