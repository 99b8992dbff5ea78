//! Federal income tax estimation engine.
//!
//! A [`TaxReturn`] snapshot and a [`tables::ReferenceTables`] set go in; a
//! fully itemized [`CalculationResult`] comes out. The engine is pure: it
//! reads the tables, never mutates them, and carries no state between runs.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::tables::tax_year_2025;
//! use tax_core::{FilingStatus, TaxReturn, WageRecord, calculate};
//!
//! let mut tax_return = TaxReturn::new(2025, FilingStatus::MarriedFilingJointly);
//! tax_return
//!     .income
//!     .wages
//!     .push(WageRecord::new("Acme", dec!(90000), dec!(7000)));
//!
//! let result = calculate(&tax_year_2025(), &tax_return).unwrap();
//!
//! // 2385 + 0.12 × (60000 − 23850)
//! assert_eq!(result.income_tax, dec!(6723.00));
//! assert!(result.is_refund);
//! ```

pub mod calculations;
pub mod db;
pub mod models;
pub mod tables;

pub use calculations::{CalculationError, TaxEngine, calculate};
pub use db::{RepositoryError, ReturnRepository};
pub use models::*;
pub use tables::{ByFilingStatus, ReferenceTableError, ReferenceTables};
