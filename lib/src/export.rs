use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate};
use csv::WriterBuilder;
use tokio::fs;

use crate::{
    config::ColumnMode,
    error::{self, Error},
    types::Kline,
};

pub const MAIN_COLUMNS: [&str; 6] =
    ["Timestamp", "Open", "High", "Low", "Close", "Volume"];

pub const ALL_COLUMNS: [&str; 12] = [
    "Timestamp",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Close Time",
    "Quote Asset Volume",
    "Number of Trades",
    "Taker Buy Base Volume",
    "Taker Buy Quote Volume",
    "Date",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Klines projected onto the columns of a [`ColumnMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub mode: ColumnMode,
    pub klines: Vec<Kline>,
}

impl ExportTable {
    pub fn new(mode: ColumnMode, klines: Vec<Kline>) -> Self {
        Self { mode, klines }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self.mode {
            ColumnMode::Main => &MAIN_COLUMNS,
            ColumnMode::All => &ALL_COLUMNS,
        }
    }

    pub fn len(&self) -> usize {
        self.klines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.klines.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.klines.iter().map(|kline| row(self.mode, kline))
    }
}

fn row(mode: ColumnMode, kline: &Kline) -> Vec<String> {
    let mut row = vec![
        kline.open_time.to_string(),
        kline.open.to_string(),
        kline.high.to_string(),
        kline.low.to_string(),
        kline.close.to_string(),
        kline.volume.to_string(),
    ];
    if mode == ColumnMode::All {
        row.extend([
            kline.close_time.to_string(),
            kline.quote_volume.to_string(),
            kline.trades.to_string(),
            kline.taker_buy_base_volume.to_string(),
            kline.taker_buy_quote_volume.to_string(),
            format_date(kline.open_time),
        ]);
    }
    row
}

/// Renders epoch milliseconds as a UTC `YYYY-MM-DD HH:MM:SS` string.
pub fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// The first and last millisecond of `year` in UTC, both inclusive.
pub fn year_range_ms(year: i32) -> Result<(i64, i64), Error> {
    let start_ms = |year: i32| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc().timestamp_millis())
    };
    let start = start_ms(year).ok_or(Error::InvalidYear(year))?;
    let next = year
        .checked_add(1)
        .and_then(start_ms)
        .ok_or(Error::InvalidYear(year))?;
    Ok((start, next - 1))
}

pub fn output_path(
    save_path: &Path,
    symbol: &str,
    year: i32,
    interval: &str,
) -> PathBuf {
    save_path.join(format!("ohlc_{symbol}_{year}_{interval}.csv"))
}

/// Writes `table` to `file_path`, replacing any existing file. Missing parent
/// directories are created. The header row is always written.
pub async fn write_csv(
    file_path: &Path,
    table: &ExportTable,
) -> Result<(), error::FileIo> {
    if let Some(parent_dir) = file_path.parent() {
        fs::create_dir_all(parent_dir)
            .await
            .map_err(error::FileIo::CreateDir)?;
    }
    let file = File::create(file_path).map_err(error::FileIo::CreateFile)?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer.flush().map_err(error::FileIo::FileWrite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Datelike, Timelike};
    use rust_decimal::Decimal;

    use super::*;

    fn kline(open_time: i64) -> Kline {
        let dec = |s| Decimal::from_str(s).unwrap();
        Kline {
            open_time,
            open: dec("16541.77000000"),
            high: dec("16545.70000000"),
            low: dec("16508.39000000"),
            close: dec("16529.67000000"),
            volume: dec("4364.83570000"),
            close_time: open_time + 3_599_999,
            quote_volume: dec("72146483.48410510"),
            trades: 114_118,
            taker_buy_base_volume: dec("2179.12830000"),
            taker_buy_quote_volume: dec("36019460.15478920"),
            ignore: "0".to_string(),
        }
    }

    #[test]
    fn year_range_covers_whole_year() {
        let (start, end) = year_range_ms(2023).unwrap();
        assert_eq!(start, 1_672_531_200_000);
        assert_eq!(end, 1_704_067_199_999);
        assert!(end > start);
    }

    #[test]
    fn year_range_ends_one_ms_before_next_year() {
        for year in [1970, 1999, 2000, 2020, 2024, 2100] {
            let (start, end) = year_range_ms(year).unwrap();
            let (next_start, _) = year_range_ms(year + 1).unwrap();
            assert_eq!(end, next_start - 1);
            assert!(end > start);

            let date = DateTime::from_timestamp_millis(start).unwrap();
            assert_eq!((date.year(), date.month(), date.day()), (year, 1, 1));
            assert_eq!((date.hour(), date.minute(), date.second()), (0, 0, 0));
        }
    }

    #[test]
    fn leap_year_has_366_days() {
        let (start, end) = year_range_ms(2024).unwrap();
        assert_eq!(end + 1 - start, 366 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn unrepresentable_year_is_an_error() {
        assert!(matches!(
            year_range_ms(i32::MAX),
            Err(Error::InvalidYear(i32::MAX))
        ));
    }

    #[test]
    fn main_mode_has_six_columns() {
        let table = ExportTable::new(ColumnMode::Main, vec![kline(1_672_531_200_000)]);
        assert_eq!(
            table.headers(),
            ["Timestamp", "Open", "High", "Low", "Close", "Volume"]
        );
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(
            rows[0],
            [
                "1672531200000",
                "16541.77000000",
                "16545.70000000",
                "16508.39000000",
                "16529.67000000",
                "4364.83570000"
            ]
        );
    }

    #[test]
    fn all_mode_drops_placeholder_and_adds_date() {
        let table = ExportTable::new(ColumnMode::All, vec![kline(1_672_531_200_000)]);
        let headers = table.headers();
        assert_eq!(headers.len(), 12);
        assert!(!headers.contains(&"Ignore"));
        assert_eq!(headers.last(), Some(&"Date"));
        assert_eq!(&headers[..6], MAIN_COLUMNS);

        let row = table.rows().next().unwrap();
        assert_eq!(row.len(), headers.len());
        assert_eq!(row[6], "1672534799999");
        assert_eq!(row[8], "114118");
        assert_eq!(row[11], "2023-01-01 00:00:00");
    }

    #[test]
    fn formats_date_in_utc() {
        assert_eq!(format_date(0), "1970-01-01 00:00:00");
        assert_eq!(format_date(1_704_067_199_999), "2023-12-31 23:59:59");
    }

    #[test]
    fn output_path_is_deterministic() {
        let path = output_path(Path::new("data"), "BTCUSDT", 2023, "1h");
        assert_eq!(path, Path::new("data/ohlc_BTCUSDT_2023_1h.csv"));
    }
}
