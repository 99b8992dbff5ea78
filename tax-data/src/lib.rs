//! File loaders feeding the tax engine.
//!
//! - [`ReferenceTableLoader`]: a full reference table set from TOML.
//! - [`TaxBracketLoader`]: bracket schedules from CSV, overriding the
//!   schedules in an existing table set.
//! - [`ReturnLoader`]: a return snapshot from TOML.
//! - [`InformationReturnLoader`]: W-2 and 1099 rows from CSV, appended to a
//!   return's income section.

mod brackets;
mod information_returns;
mod returns;
mod tables;

use rust_decimal::Decimal;
use serde::Deserialize;

pub use brackets::{
    TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord, schedule_to_filing_status,
};
pub use information_returns::{
    InformationReturnError, InformationReturnForm, InformationReturnLoader, InformationReturnRecord,
};
pub use returns::{ReturnLoadError, ReturnLoader};
pub use tables::{ReferenceTableLoadError, ReferenceTableLoader};

/// Reads an optional decimal cell; blank cells are `None`.
pub(crate) fn deserialize_optional_decimal<'de, D>(
    deserializer: D
) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
