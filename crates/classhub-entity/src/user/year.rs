//! Academic year enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The academic year a user reports on their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "academic_year", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AcademicYear {
    FirstYear,
    SecondYear,
    ThirdYear,
    FourthYear,
}

impl AcademicYear {
    /// Return the year as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstYear => "first_year",
            Self::SecondYear => "second_year",
            Self::ThirdYear => "third_year",
            Self::FourthYear => "fourth_year",
        }
    }

    /// Human-readable label, e.g. `"First Year"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstYear => "First Year",
            Self::SecondYear => "Second Year",
            Self::ThirdYear => "Third Year",
            Self::FourthYear => "Fourth Year",
        }
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AcademicYear {
    type Err = classhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the storage form ("first_year") and the display
        // form ("First Year").
        match s.to_lowercase().replace(' ', "_").as_str() {
            "first_year" => Ok(Self::FirstYear),
            "second_year" => Ok(Self::SecondYear),
            "third_year" => Ok(Self::ThirdYear),
            "fourth_year" => Ok(Self::FourthYear),
            _ => Err(classhub_core::AppError::validation(format!(
                "Invalid academic year: '{s}'"
            ))),
        }
    }
}
