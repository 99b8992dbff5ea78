use std::fmt;

use serde::{Deserialize, Serialize};

/// Filing statuses supported by the estimator.
///
/// This is a closed set: every per-status reference table must carry an
/// entry for each variant (see [`ByFilingStatus`](crate::tables::ByFilingStatus)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[serde(alias = "S")]
    Single,
    #[serde(alias = "MFJ")]
    MarriedFilingJointly,
    #[serde(alias = "HOH")]
    HeadOfHousehold,
}

impl FilingStatus {
    /// Every filing status, in table order.
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::HeadOfHousehold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::HeadOfHousehold => "HOH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::Single),
            "MFJ" => Some(Self::MarriedFilingJointly),
            "HOH" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::HeadOfHousehold => "Head of Household",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}
