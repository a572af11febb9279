use serde::{Deserialize, Serialize};

/// Current position in one symbol, derived from the trade log.
///
/// Never persisted: holdings are rebuilt from scratch every time the log
/// changes, then decorated with the latest known live price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Uppercased ticker symbol
    pub symbol: String,

    /// Shares held (sum of BUY minus SELL quantities)
    pub quantity: u64,

    /// Unweighted mean of every BUY price ever recorded for this symbol,
    /// rounded to 4 decimals
    pub average_open_price: f64,

    /// Latest fetched price, 0.0 until the first successful fetch
    pub last_price: f64,

    /// False until a live price has been obtained for this symbol
    pub last_price_valid: bool,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: u64, average_open_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            average_open_price,
            last_price: 0.0,
            last_price_valid: false,
        }
    }

    /// Amount paid to open the position: `average_open_price × quantity`.
    pub fn cost(&self) -> f64 {
        self.average_open_price * self.quantity as f64
    }

    /// Market value: `last_price × quantity`.
    pub fn value(&self) -> f64 {
        self.last_price * self.quantity as f64
    }

    /// Unrealized profit/loss: `(last_price − average_open_price) × quantity`.
    pub fn profit_loss(&self) -> f64 {
        (self.last_price - self.average_open_price) * self.quantity as f64
    }

    /// Profit/loss as a fraction of cost. NaN when the cost is zero.
    pub fn profit_loss_perc(&self) -> f64 {
        let cost = self.cost();
        if cost == 0.0 {
            f64::NAN
        } else {
            self.profit_loss() / cost
        }
    }

    /// Apply a live price.
    pub fn set_last_price(&mut self, price: f64) {
        self.last_price = price;
        self.last_price_valid = true;
    }
}
