use crate::models::analytics::{HoldingSummary, PortfolioSummary};
use crate::models::portfolio::Portfolio;
use crate::models::trade::Action;

/// Computes portfolio valuation: holdings value, total value, profit/loss.
///
/// All figures use the last known live price of each holding. A holding that
/// has never been priced contributes 0 to value and shows a full loss in P/L;
/// check `Holding::last_price_valid` (or `PortfolioSummary::prices_valid`)
/// before trusting the numbers.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Σ quantity × last price.
    pub fn holdings_value(&self, portfolio: &Portfolio) -> f64 {
        portfolio.holdings.values().map(|h| h.value()).sum()
    }

    /// cash + holdings value.
    pub fn total_value(&self, portfolio: &Portfolio) -> f64 {
        portfolio.cash_available + self.holdings_value(portfolio)
    }

    /// Cash put in by the owner: deposits minus withdrawals.
    /// Dividends are returns, not contributions.
    pub fn net_contributed(&self, portfolio: &Portfolio) -> f64 {
        portfolio
            .trade_log
            .iter()
            .map(|t| match t.action() {
                Action::Deposit => t.quantity() as f64,
                Action::Withdraw => -(t.quantity() as f64),
                _ => 0.0,
            })
            .sum()
    }

    /// Whole-history profit/loss: total value − net cash contributed.
    pub fn portfolio_pl(&self, portfolio: &Portfolio) -> f64 {
        self.total_value(portfolio) - self.net_contributed(portfolio)
    }

    /// Whole-history profit/loss as a fraction of net contributions.
    pub fn portfolio_pl_perc(&self, portfolio: &Portfolio) -> f64 {
        ratio(self.portfolio_pl(portfolio), self.net_contributed(portfolio))
    }

    /// Unrealized profit/loss summed over open positions.
    pub fn open_positions_pl(&self, portfolio: &Portfolio) -> f64 {
        portfolio.holdings.values().map(|h| h.profit_loss()).sum()
    }

    /// Unrealized profit/loss as a fraction of the open positions' cost.
    pub fn open_positions_pl_perc(&self, portfolio: &Portfolio) -> f64 {
        let cost: f64 = portfolio.holdings.values().map(|h| h.cost()).sum();
        ratio(self.open_positions_pl(portfolio), cost)
    }

    /// True when every holding carries a live price. Vacuously true when
    /// nothing is held.
    pub fn prices_valid(&self, portfolio: &Portfolio) -> bool {
        portfolio.holdings.values().all(|h| h.last_price_valid)
    }

    /// Everything the UI needs to render balances and the holdings table.
    pub fn get_portfolio_summary(&self, portfolio: &Portfolio) -> PortfolioSummary {
        let holdings: Vec<HoldingSummary> = portfolio
            .holding_list()
            .into_iter()
            .map(HoldingSummary::from)
            .collect();

        PortfolioSummary {
            total_trades: portfolio.trade_log.len(),
            cash_available: portfolio.cash_available,
            holdings_value: self.holdings_value(portfolio),
            total_value: self.total_value(portfolio),
            net_contributed: self.net_contributed(portfolio),
            portfolio_pl: self.portfolio_pl(portfolio),
            portfolio_pl_perc: self.portfolio_pl_perc(portfolio),
            open_positions_pl: self.open_positions_pl(portfolio),
            open_positions_pl_perc: self.open_positions_pl_perc(portfolio),
            prices_valid: self.prices_valid(portfolio),
            holdings,
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}
