use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Date format used in trade records and user input (e.g. "21/03/2019").
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Buy shares of a symbol
    Buy,
    /// Sell shares of a symbol
    Sell,
    /// Add cash to the portfolio
    Deposit,
    /// Take cash out of the portfolio
    Withdraw,
    /// Cash paid out by a held symbol
    Dividend,
}

impl Action {
    /// Whether this action moves shares of a symbol (as opposed to cash).
    pub fn is_share_action(&self) -> bool {
        matches!(self, Action::Buy | Action::Sell)
    }

    /// Whether this action requires a symbol.
    pub fn requires_symbol(&self) -> bool {
        matches!(self, Action::Buy | Action::Sell | Action::Dividend)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Deposit => "DEPOSIT",
            Action::Withdraw => "WITHDRAW",
            Action::Dividend => "DIVIDEND",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "DEPOSIT" => Ok(Action::Deposit),
            "WITHDRAW" => Ok(Action::Withdraw),
            "DIVIDEND" => Ok(Action::Dividend),
            other => Err(CoreError::ValidationError(format!(
                "Unknown trade action '{other}'"
            ))),
        }
    }
}

/// A single immutable entry of the trade log.
///
/// Fields are private: the only way to obtain a `Trade` is through one of the
/// validating constructors, so every `Trade` in the system is well formed.
/// `quantity` is a share count for BUY/SELL and a whole cash amount for
/// DEPOSIT/WITHDRAW/DIVIDEND.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    date: NaiveDate,
    action: Action,
    quantity: u64,
    symbol: Option<String>,
    price: f64,
    fee: f64,
    stamp_duty: f64,
}

impl Trade {
    /// Build a trade from typed values.
    ///
    /// The symbol is trimmed and uppercased. It is required for BUY, SELL and
    /// DIVIDEND and discarded for DEPOSIT and WITHDRAW.
    pub fn new(
        date: NaiveDate,
        action: Action,
        quantity: i64,
        symbol: Option<&str>,
        price: f64,
        fee: f64,
        stamp_duty: f64,
    ) -> Result<Self, CoreError> {
        if quantity < 0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity must not be negative (got {quantity})"
            )));
        }
        check_non_negative("price", price)?;
        check_non_negative("fee", fee)?;
        check_non_negative("stamp duty", stamp_duty)?;

        let symbol = if action.requires_symbol() {
            let normalized = symbol
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    CoreError::ValidationError(format!("A symbol is required for {action}"))
                })?;
            Some(normalized)
        } else {
            None
        };

        Ok(Self {
            date,
            action,
            quantity: quantity as u64,
            symbol,
            price,
            fee,
            stamp_duty,
        })
    }

    /// Build a trade from raw user input, parsing the date (`DD/MM/YYYY`)
    /// and the action name.
    pub fn create(
        date: &str,
        action: &str,
        quantity: i64,
        symbol: &str,
        price: f64,
        fee: f64,
        stamp_duty: f64,
    ) -> Result<Self, CoreError> {
        let date = parse_date(date)?;
        let action = action.parse::<Action>()?;
        Self::new(date, action, quantity, Some(symbol), price, fee, stamp_duty)
    }

    /// Serialize all fields into a persistable record.
    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            date: self.date.format(DATE_FORMAT).to_string(),
            action: self.action.as_str().to_string(),
            quantity: self.quantity as i64,
            symbol: self.symbol.clone().unwrap_or_default(),
            price: self.price,
            fee: self.fee,
            stamp_duty: self.stamp_duty,
        }
    }

    /// Inverse of [`Trade::to_record`], re-running full validation.
    pub fn from_record(record: &TradeRecord) -> Result<Self, CoreError> {
        Self::create(
            &record.date,
            &record.action,
            record.quantity,
            &record.symbol,
            record.price,
            record.fee,
            record.stamp_duty,
        )
    }

    /// Parse an untyped map (e.g. one JSON object of a trade log).
    /// Fails with a validation error if any key is missing or mistyped.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        let record: TradeRecord = serde_json::from_value(value).map_err(|e| {
            CoreError::ValidationError(format!("Trade record not well formatted: {e}"))
        })?;
        Self::from_record(&record)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Symbol for BUY/SELL/DIVIDEND, `None` for cash movements.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// Stamp duty as a percentage. Recorded only; not applied to cash or cost basis.
    pub fn stamp_duty(&self) -> f64 {
        self.stamp_duty
    }
}

/// Flat, serializable form of a [`Trade`], one per entry in the trade log file.
///
/// Every key is required. `quantity` also accepts the legacy key `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: String,
    pub action: String,
    #[serde(alias = "amount")]
    pub quantity: i64,
    pub symbol: String,
    pub price: f64,
    pub fee: f64,
    pub stamp_duty: f64,
}

/// Parse a `DD/MM/YYYY` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|e| {
        CoreError::ValidationError(format!("Invalid date '{date}' (expected DD/MM/YYYY): {e}"))
    })
}

fn check_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "{field} must be a non-negative number (got {value})"
        )));
    }
    Ok(())
}
