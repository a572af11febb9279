use std::collections::HashMap;

/// Symbol → last traded price, as produced by one completed refresh cycle.
pub type PriceMap = HashMap<String, f64>;

/// Outcome of asking a quote source for the last traded price of a symbol.
///
/// `Unavailable` is not an error: it means "no update this cycle" and the
/// previously cached price (if any) is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LastPrice {
    Available(f64),
    Unavailable,
}

impl LastPrice {
    /// Only finite, non-negative prices are accepted as available.
    pub fn from_price(price: f64) -> Self {
        if price.is_finite() && price >= 0.0 {
            LastPrice::Available(price)
        } else {
            LastPrice::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LastPrice::Available(_))
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            LastPrice::Available(p) => Some(*p),
            LastPrice::Unavailable => None,
        }
    }
}

impl From<Option<f64>> for LastPrice {
    fn from(price: Option<f64>) -> Self {
        price.map(LastPrice::from_price).unwrap_or(LastPrice::Unavailable)
    }
}
