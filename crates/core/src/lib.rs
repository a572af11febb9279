pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

use config::AppConfig;
use errors::CoreError;
use models::{
    analytics::PortfolioSummary,
    holding::Holding,
    portfolio::Portfolio,
    price::PriceMap,
    trade::Trade,
};
use providers::{registry::QuoteSourceRegistry, traits::QuoteFetcher};
use services::{
    analytics_service::AnalyticsService,
    portfolio_service::PortfolioService,
    price_refresh::{self, PriceRefreshTask, RefreshState},
};
use storage::database::DatabaseHandler;

/// Typed observer for the two events the core emits.
///
/// `on_live_prices_updated` runs on the refresh worker after the prices have
/// been merged; `on_trade_log_changed` runs on the thread that changed the log.
/// Both default to no-ops. Neither may call [`TradingMate::stop`].
pub trait PortfolioObserver: Send + Sync {
    fn on_live_prices_updated(&self, _prices: &PriceMap) {}

    fn on_trade_log_changed(&self) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl PortfolioObserver for NoopObserver {}

/// Main entry point for the TradingMate core library.
///
/// Owns the portfolio and drives the background price refresh. The control
/// thread owns `TradingMate` and is the only writer of the trade log (all
/// log mutations take `&mut self`); the refresh worker only ever reaches the
/// portfolio through [`TradingMate::merge_live_prices`]'s write lock.
#[must_use]
pub struct TradingMate {
    portfolio: Arc<RwLock<Portfolio>>,
    portfolio_service: PortfolioService,
    analytics_service: AnalyticsService,
    database: DatabaseHandler,
    refresh: PriceRefreshTask,
    observer: Arc<dyn PortfolioObserver>,
    polling_period: Duration,
}

impl std::fmt::Debug for TradingMate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let portfolio = self.read();
        f.debug_struct("TradingMate")
            .field("trades", &portfolio.trade_log.len())
            .field("holdings", &portfolio.holdings.len())
            .field("cash_available", &portfolio.cash_available)
            .field("db_filepath", &self.database.db_filepath())
            .field("refresh_state", &self.refresh.state())
            .finish()
    }
}

impl TradingMate {
    /// Build with an explicit quote source. The refresh task is spawned on
    /// `runtime` when [`TradingMate::start`] is called.
    pub fn new(
        config: &AppConfig,
        fetcher: Arc<dyn QuoteFetcher>,
        observer: Arc<dyn PortfolioObserver>,
        runtime: Handle,
    ) -> Self {
        let portfolio = Arc::new(RwLock::new(Portfolio::new()));

        let symbols = {
            let portfolio = portfolio.clone();
            move || {
                portfolio
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .held_symbols()
            }
        };
        let sink = {
            let portfolio = portfolio.clone();
            let observer = observer.clone();
            move |prices: PriceMap| {
                merge_into(&portfolio, &prices);
                observer.on_live_prices_updated(&prices);
            }
        };

        let refresh = PriceRefreshTask::new(runtime, fetcher, Arc::new(symbols), Arc::new(sink));

        Self {
            portfolio,
            portfolio_service: PortfolioService::new(),
            analytics_service: AnalyticsService::new(),
            database: DatabaseHandler::new(config.trading_database_path()),
            refresh,
            observer,
            polling_period: config.alpha_vantage_polling_period(),
        }
    }

    /// Build with the default quote sources (Alpha Vantage when a key is
    /// configured, Yahoo Finance as fallback).
    pub fn with_default_sources(
        config: &AppConfig,
        observer: Arc<dyn PortfolioObserver>,
        runtime: Handle,
    ) -> Self {
        let registry = QuoteSourceRegistry::new_with_defaults(
            config.alpha_vantage_base_url(),
            config.alpha_vantage_api_key(),
        );
        Self::new(config, Arc::new(registry), observer, runtime)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Load the configured trade log and start the periodic refresh.
    /// Nothing is loaded if the polling period is invalid or the task has
    /// already been stopped.
    pub fn start(&mut self) -> Result<(), CoreError> {
        price_refresh::check_period(self.polling_period)?;
        if self.refresh.state() == RefreshState::Stopped {
            return Err(CoreError::RefreshStopped);
        }
        let trades = self.database.read_trades(None)?;
        self.load_trades(trades)?;
        self.refresh.start(self.polling_period)
    }

    /// Stop the refresh task, then write the trade log back to its file.
    /// After this returns no live price callback fires.
    pub fn stop(&mut self) -> Result<(), CoreError> {
        self.refresh.stop();
        self.save_log(None)
    }

    /// Request an out-of-band refresh cycle.
    pub fn refresh_now(&self) -> Result<(), CoreError> {
        self.refresh.trigger_now()
    }

    /// Pause or resume periodic refreshes.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.refresh.set_auto_refresh(enabled);
    }

    #[must_use]
    pub fn auto_refresh(&self) -> bool {
        self.refresh.auto_refresh()
    }

    #[must_use]
    pub fn refresh_state(&self) -> RefreshState {
        self.refresh.state()
    }

    // ── Trade Log ───────────────────────────────────────────────────

    /// Replace the whole trade log. All-or-nothing.
    pub fn load_trades(&mut self, trades: Vec<Trade>) -> Result<(), CoreError> {
        let count = trades.len();
        self.portfolio_service.replace_log(&mut self.write(), trades)?;
        info!("Loaded {count} trade(s)");
        self.observer.on_trade_log_changed();
        Ok(())
    }

    /// Append a trade. Rejected (log unchanged) if it would leave a negative
    /// holding.
    pub fn add_trade(&mut self, trade: Trade) -> Result<(), CoreError> {
        let summary = format!("{} {} {}", trade.action(), trade.quantity(), trade.symbol().unwrap_or(""));
        self.portfolio_service.add_trade(&mut self.write(), trade)?;
        info!("Trade added: {}", summary.trim_end());
        self.observer.on_trade_log_changed();
        Ok(())
    }

    /// Remove the most recent trade. Fails with `EmptyTradeLog` when there
    /// is nothing to remove.
    pub fn remove_last_trade(&mut self) -> Result<Trade, CoreError> {
        let removed = self.portfolio_service.remove_last_trade(&mut self.write())?;
        info!("Last trade removed ({} on {})", removed.action(), removed.date());
        self.observer.on_trade_log_changed();
        Ok(removed)
    }

    /// Check a prospective trade against the current holdings and cash.
    #[must_use]
    pub fn is_trade_valid(&self, trade: &Trade) -> bool {
        self.portfolio_service.is_trade_valid(&self.read(), trade)
    }

    /// Copy of the trade log, oldest first.
    #[must_use]
    pub fn trade_log(&self) -> Vec<Trade> {
        self.read().trade_log.clone()
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Load the trade log stored at `path` and make it the current file.
    /// On any failure both the file path and the portfolio are unchanged.
    pub fn open_log(&mut self, path: &Path) -> Result<(), CoreError> {
        let mut database = self.database.clone();
        let trades = database.read_trades(Some(path))?;
        self.load_trades(trades)?;
        self.database = database;
        Ok(())
    }

    /// Write the trade log to `path`, or to the current file when `None`.
    pub fn save_log(&mut self, path: Option<&Path>) -> Result<(), CoreError> {
        let records: Vec<_> = self.read().trade_log.iter().map(Trade::to_record).collect();
        self.database.write_data(path, &records)
    }

    #[must_use]
    pub fn db_filepath(&self) -> &Path {
        self.database.db_filepath()
    }

    // ── Live Prices ─────────────────────────────────────────────────

    /// Merge a price map into the holdings. This is the single entrypoint
    /// shared with the refresh worker; it serializes with trade mutations.
    pub fn merge_live_prices(&self, prices: &PriceMap) {
        merge_into(&self.portfolio, prices);
    }

    /// Every live price received so far.
    #[must_use]
    pub fn last_price_snapshot(&self) -> PriceMap {
        self.read().last_price_snapshot.clone()
    }

    // ── Holdings & Value ────────────────────────────────────────────

    #[must_use]
    pub fn cash_available(&self) -> f64 {
        self.read().cash_available
    }

    /// Current holdings sorted by symbol.
    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.read().holding_list().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn holding(&self, symbol: &str) -> Option<Holding> {
        self.read().holdings.get(&symbol.to_uppercase()).cloned()
    }

    #[must_use]
    pub fn holdings_value(&self) -> f64 {
        self.analytics_service.holdings_value(&self.read())
    }

    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.analytics_service.total_value(&self.read())
    }

    #[must_use]
    pub fn portfolio_pl(&self) -> f64 {
        self.analytics_service.portfolio_pl(&self.read())
    }

    #[must_use]
    pub fn portfolio_pl_perc(&self) -> f64 {
        self.analytics_service.portfolio_pl_perc(&self.read())
    }

    #[must_use]
    pub fn open_positions_pl(&self) -> f64 {
        self.analytics_service.open_positions_pl(&self.read())
    }

    #[must_use]
    pub fn open_positions_pl_perc(&self) -> f64 {
        self.analytics_service.open_positions_pl_perc(&self.read())
    }

    /// Consistent snapshot of every balance, taken under one read lock.
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        self.analytics_service.get_portfolio_summary(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, Portfolio> {
        self.portfolio.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Portfolio> {
        self.portfolio.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn merge_into(portfolio: &RwLock<Portfolio>, prices: &PriceMap) {
    let mut guard = portfolio.write().unwrap_or_else(|e| e.into_inner());
    PortfolioService::new().merge_live_prices(&mut guard, prices);
}
