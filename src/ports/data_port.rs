//! Price data access port trait.

use crate::domain::error::StratlabError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` in ascending time order, optionally bounded by
    /// inclusive start and end dates.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, StratlabError>;

    fn list_symbols(&self) -> Result<Vec<String>, StratlabError>;
}
