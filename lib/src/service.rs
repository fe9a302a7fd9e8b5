use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, instrument, warn};

use crate::{
    client::MarketData,
    config::Config,
    error::Error,
    export::{output_path, write_csv, year_range_ms, ExportTable},
    types::KlineRequestBuilder,
};

/// What to do when a single (symbol, year) export fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log the error and move on to the next pair.
    Continue,
}

/// A (symbol, year) pair that could not be exported.
#[derive(Debug)]
pub struct Failure {
    pub symbol: String,
    pub year: i32,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub exported: usize,
    pub failures: Vec<Failure>,
}

pub struct Service<C> {
    client: C,
    config: Config,
}

impl<C: MarketData> Service<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of (symbol, year) pairs a full run exports.
    pub fn num_pairs(&self) -> usize {
        self.config.symbols.len() * self.config.years.len()
    }

    /// Exports every configured symbol for every configured year, symbols
    /// in the outer loop. Pairs run one after another.
    #[instrument(skip_all)]
    pub async fn export_all(
        &self,
        policy: FailurePolicy,
        progress_bar: &ProgressBar,
    ) -> Result<Summary, Error> {
        info!(
            num_symbols = self.config.symbols.len(),
            num_years = self.config.years.len(),
            interval = %self.config.interval,
            columns = %self.config.columns,
            save_path = ?self.config.save_path,
            "Starting to fetch data..."
        );

        let mut summary = Summary::default();
        for symbol in &self.config.symbols {
            for &year in &self.config.years {
                match self.export(symbol, year).await {
                    Ok(_) => summary.exported += 1,
                    Err(e) if policy == FailurePolicy::Continue => {
                        error!(error = %e, symbol = %symbol, year, "Encountered an error when exporting, continuing");
                        summary.failures.push(Failure {
                            symbol: symbol.clone(),
                            year,
                            error: e,
                        });
                    }
                    Err(e) => {
                        progress_bar.abandon();
                        return Err(e);
                    }
                }
                progress_bar.inc(1);
            }
        }

        progress_bar.finish();
        info!(
            exported = summary.exported,
            failed = summary.failures.len(),
            "Finished fetching data!"
        );
        Ok(summary)
    }

    /// Fetches one calendar year of klines for `symbol`, writes them to
    /// `$save_path/ohlc_$symbol_$year_$interval.csv` and returns the table.
    #[instrument(skip(self), err)]
    pub async fn export(
        &self,
        symbol: &str,
        year: i32,
    ) -> Result<ExportTable, Error> {
        let (start_ms, end_ms) = year_range_ms(year)?;
        let request = KlineRequestBuilder::default()
            .symbol(symbol)
            .interval(self.config.interval.as_str())
            .start_ms(start_ms)
            .end_ms(end_ms)
            .build()?;

        info!("Fetching {symbol} data for {year}");
        let klines = self.client.get_historical_klines(&request).await?;
        if klines.is_empty() {
            warn!("Got no results");
        }
        let table = ExportTable::new(self.config.columns, klines);

        let file_path = output_path(
            &self.config.save_path,
            symbol,
            year,
            &self.config.interval,
        );
        write_csv(&file_path, &table).await?;
        info!(rows = table.len(), file = %file_path.display(), "Saved data");
        Ok(table)
    }
}

pub fn style() -> ProgressStyle {
    ProgressStyle::with_template(
        "[{elapsed}] {bar:40.cyan/blue} {pos:>4}/{len:4} {percent}% {msg}",
    )
    .expect("always valid if tests pass")
}
