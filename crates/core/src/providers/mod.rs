pub mod registry;
pub mod traits;

// Quote source implementations
pub mod alphavantage;
pub mod yahoo_finance;
