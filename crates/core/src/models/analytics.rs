use serde::{Deserialize, Serialize};

use super::holding::Holding;

/// Point-in-time valuation of the whole portfolio.
///
/// All `*_perc` values are fractions (0.2 == 20%) and NaN when their
/// denominator is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of entries in the trade log
    pub total_trades: usize,

    /// Running cash balance
    pub cash_available: f64,

    /// Sum of quantity × last price over all holdings
    pub holdings_value: f64,

    /// cash_available + holdings_value
    pub total_value: f64,

    /// Deposits minus withdrawals
    pub net_contributed: f64,

    /// total_value − net_contributed
    pub portfolio_pl: f64,

    /// portfolio_pl / net_contributed
    pub portfolio_pl_perc: f64,

    /// Unrealized profit/loss over open positions
    pub open_positions_pl: f64,

    /// open_positions_pl / total cost of open positions
    pub open_positions_pl_perc: f64,

    /// True when every holding has a live price
    pub prices_valid: bool,

    /// Per-holding rows, sorted by symbol
    pub holdings: Vec<HoldingSummary>,
}

/// One row of the holdings table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub symbol: String,
    pub quantity: u64,
    pub average_open_price: f64,
    pub last_price: f64,
    pub last_price_valid: bool,
    pub cost: f64,
    pub value: f64,
    pub profit_loss: f64,
    pub profit_loss_perc: f64,
}

impl From<&Holding> for HoldingSummary {
    fn from(h: &Holding) -> Self {
        Self {
            symbol: h.symbol.clone(),
            quantity: h.quantity,
            average_open_price: h.average_open_price,
            last_price: h.last_price,
            last_price_valid: h.last_price_valid,
            cost: h.cost(),
            value: h.value(),
            profit_loss: h.profit_loss(),
            profit_loss_perc: h.profit_loss_perc(),
        }
    }
}
