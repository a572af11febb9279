use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;
use crate::models::price::PriceMap;
use crate::models::trade::{Action, Trade, DATE_FORMAT};

/// Result of folding a trade log: everything derivable without prices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub cash_available: f64,
    pub holdings: HashMap<String, Holding>,
}

/// Manages the trade log and derives cash and holdings from it.
///
/// Pure business logic with no I/O and no locking. Every mutating
/// method is all-or-nothing: on error the portfolio is left exactly as it was.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Fold a sequence of trades, in order, into cash and holdings.
    ///
    /// - DEPOSIT and DIVIDEND add their quantity to cash, WITHDRAW subtracts it.
    /// - BUY/SELL move shares only; they never touch cash.
    /// - A SELL that would drive a symbol below zero aborts the fold.
    ///
    /// Symbols whose quantity ends at zero are dropped from the holdings.
    pub fn compute_ledger(&self, trades: &[Trade]) -> Result<Ledger, CoreError> {
        let mut cash = 0.0;
        let mut quantities: HashMap<&str, u64> = HashMap::new();
        // symbol → (sum of BUY prices, BUY count)
        let mut buy_prices: HashMap<&str, (f64, u32)> = HashMap::new();

        for trade in trades {
            match trade.action() {
                Action::Deposit | Action::Dividend => cash += trade.quantity() as f64,
                Action::Withdraw => cash -= trade.quantity() as f64,
                Action::Buy => {
                    let symbol = Self::share_symbol(trade)?;
                    let held = quantities.entry(symbol).or_insert(0);
                    *held = held.checked_add(trade.quantity()).ok_or_else(|| {
                        CoreError::ValidationError(format!(
                            "Holding of {symbol} would exceed {} shares on {}",
                            u64::MAX,
                            trade.date().format(DATE_FORMAT)
                        ))
                    })?;
                    let entry = buy_prices.entry(symbol).or_insert((0.0, 0));
                    entry.0 += trade.price();
                    entry.1 += 1;
                }
                Action::Sell => {
                    let symbol = Self::share_symbol(trade)?;
                    let held = quantities.get(symbol).copied().unwrap_or(0);
                    if held < trade.quantity() {
                        return Err(CoreError::InconsistentLedger {
                            symbol: symbol.to_string(),
                            quantity: trade.quantity(),
                            held,
                            date: trade.date().format(DATE_FORMAT).to_string(),
                        });
                    }
                    quantities.insert(symbol, held - trade.quantity());
                }
            }
        }

        let holdings = quantities
            .into_iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(symbol, qty)| {
                let avg = buy_prices
                    .get(symbol)
                    .map(|(sum, count)| round4(sum / f64::from(*count)))
                    .unwrap_or(0.0);
                (symbol.to_string(), Holding::new(symbol, qty, avg))
            })
            .collect();

        Ok(Ledger {
            cash_available: cash,
            holdings,
        })
    }

    /// Rebuild cash and holdings from the portfolio's trade log.
    ///
    /// On success holdings are replaced wholesale and re-decorated with the
    /// last known live prices. On failure nothing is touched.
    pub fn recompute_from_log(&self, portfolio: &mut Portfolio) -> Result<(), CoreError> {
        let ledger = self.compute_ledger(&portfolio.trade_log)?;
        portfolio.cash_available = ledger.cash_available;
        portfolio.holdings = ledger.holdings;
        let snapshot = portfolio.last_price_snapshot.clone();
        Self::apply_prices(portfolio, &snapshot);
        debug!(
            trades = portfolio.trade_log.len(),
            holdings = portfolio.holdings.len(),
            cash = portfolio.cash_available,
            "Portfolio recomputed"
        );
        Ok(())
    }

    /// Replace the whole trade log (e.g. after opening a file).
    /// The previous log is kept if the new one is inconsistent.
    pub fn replace_log(&self, portfolio: &mut Portfolio, trades: Vec<Trade>) -> Result<(), CoreError> {
        let previous = std::mem::replace(&mut portfolio.trade_log, trades);
        if let Err(e) = self.recompute_from_log(portfolio) {
            portfolio.trade_log = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Append a trade and recompute. If the recompute fails the trade is
    /// popped again and the error is returned.
    pub fn add_trade(&self, portfolio: &mut Portfolio, trade: Trade) -> Result<(), CoreError> {
        portfolio.trade_log.push(trade);
        if let Err(e) = self.recompute_from_log(portfolio) {
            portfolio.trade_log.pop();
            warn!("Rejected trade: {e}");
            return Err(e);
        }
        Ok(())
    }

    /// Pop the most recent trade and recompute.
    pub fn remove_last_trade(&self, portfolio: &mut Portfolio) -> Result<Trade, CoreError> {
        let removed = portfolio.trade_log.pop().ok_or(CoreError::EmptyTradeLog)?;
        if let Err(e) = self.recompute_from_log(portfolio) {
            // Only reachable if the log was already inconsistent before the pop.
            portfolio.trade_log.push(removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Merge a completed refresh cycle's prices.
    ///
    /// Symbols present in `prices` get their price updated and marked valid;
    /// all other holdings are left untouched. Idempotent, last write per
    /// symbol wins.
    pub fn merge_live_prices(&self, portfolio: &mut Portfolio, prices: &PriceMap) {
        for (symbol, price) in prices {
            portfolio.last_price_snapshot.insert(symbol.clone(), *price);
        }
        Self::apply_prices(portfolio, prices);
    }

    /// Check a prospective trade against the current state without mutating it.
    ///
    /// Rejects a SELL of more shares than currently held (or of a symbol not
    /// held at all) and a WITHDRAW larger than the available cash.
    pub fn is_trade_valid(&self, portfolio: &Portfolio, trade: &Trade) -> bool {
        match trade.action() {
            Action::Sell => trade
                .symbol()
                .and_then(|s| portfolio.holdings.get(s))
                .is_some_and(|h| h.quantity >= trade.quantity()),
            Action::Withdraw => trade.quantity() as f64 <= portfolio.cash_available,
            Action::Buy | Action::Deposit | Action::Dividend => true,
        }
    }

    fn apply_prices(portfolio: &mut Portfolio, prices: &PriceMap) {
        for (symbol, price) in prices {
            if let Some(holding) = portfolio.holdings.get_mut(symbol) {
                holding.set_last_price(*price);
            }
        }
    }

    fn share_symbol(trade: &Trade) -> Result<&str, CoreError> {
        trade.symbol().ok_or_else(|| {
            CoreError::ValidationError(format!("{} trade without a symbol", trade.action()))
        })
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
