//! Structured case identifiers such as `D 01 JV 25 0000123`.

use core::{fmt, str::FromStr};

use compact_str::{CompactString, ToCompactString};

use crate::{config::CountyTable, error::CaseError};

/// Width of the zero-padded case number token.
pub const CASE_NUMBER_WIDTH: usize = 7;
/// Identifiers encode the year as an offset from this century.
pub const CENTURY: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CourtType {
    District,
    Other(CompactString),
}

impl CourtType {
    fn from_token(token: &str) -> Self {
        match token {
            "D" => Self::District,
            other => Self::Other(other.into()),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::District => "D",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseCategory {
    Juvenile,
    Other(CompactString),
}

impl CaseCategory {
    fn from_token(token: &str) -> Self {
        match token {
            "JV" => Self::Juvenile,
            other => Self::Other(other.into()),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Juvenile => "JV",
            Self::Other(s) => s,
        }
    }
}

/// A well-formed identifier has `year >= CENTURY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseIdentifier {
    pub court_type: CourtType,
    pub county_code: CompactString,
    pub category: CaseCategory,
    pub year: i32,
    pub number: u32,
}

impl CaseIdentifier {
    /// A district juvenile case, the only kind the allocator produces.
    pub fn juvenile(county_code: impl Into<CompactString>, year: i32, number: u32) -> Self {
        Self {
            court_type: CourtType::District,
            county_code: county_code.into(),
            category: CaseCategory::Juvenile,
            year,
            number,
        }
    }

    pub fn year_suffix(&self) -> CompactString {
        compact_str::format_compact!("{:02}", self.year - CENTURY)
    }

    pub fn padded_number(&self) -> CompactString {
        compact_str::format_compact!("{:0width$}", self.number, width = CASE_NUMBER_WIDTH)
    }

    /// County name, `"Unknown"` for codes outside the table.
    pub fn county<'t>(&self, counties: &'t CountyTable) -> &'t str {
        counties.name_of(&self.county_code)
    }

    pub fn canonical(&self) -> CompactString {
        self.to_compact_string()
    }
}

impl fmt::Display for CaseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.court_type.token(),
            self.county_code,
            self.category.token(),
            self.year_suffix(),
            self.padded_number(),
        )
    }
}

fn digits(token: &str) -> Option<&str> {
    (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())).then_some(token)
}

impl FromStr for CaseIdentifier {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| CaseError::MalformedIdentifier {
            input: s.into(),
            reason,
        };

        let mut tokens = s.split_whitespace();
        let (Some(court), Some(county), Some(category), Some(year), Some(number), None) = (
            tokens.next(),
            tokens.next(),
            tokens.next(),
            tokens.next(),
            tokens.next(),
            tokens.next(),
        ) else {
            return Err(malformed("expected 5 tokens"));
        };

        let year = digits(year)
            .and_then(|y| y.parse::<i32>().ok())
            .and_then(|y| y.checked_add(CENTURY))
            .ok_or_else(|| malformed("year suffix is not numeric"))?;
        let number = digits(number)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| malformed("case number is not numeric"))?;

        Ok(Self {
            court_type: CourtType::from_token(court),
            county_code: county.into(),
            category: CaseCategory::from_token(category),
            year,
            number,
        })
    }
}
