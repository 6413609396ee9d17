use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

/// The period a playlist covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    Day { date: NaiveDate },
    Month { year: i32, month: u32 },
    Year { year: i32 },
    AllTime,
    Named { name: String },
}

pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

impl Scope {
    pub fn day(date: NaiveDate) -> Self {
        Scope::Day { date }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Scope::Month { year, month }
    }

    pub fn year(year: i32) -> Self {
        Scope::Year { year }
    }

    /// Human readable title, e.g. `January 2024`.
    pub fn title(&self) -> String {
        match self {
            Scope::Day { date } => date.format("%Y-%m-%d").to_string(),
            Scope::Month { year, month } => format!("{} {}", month_name(*month), year),
            Scope::Year { year } => year.to_string(),
            Scope::AllTime => "All time".to_string(),
            Scope::Named { name } => name.clone(),
        }
    }

    /// File stem shared by the persisted playlist and its html page.
    /// Must stay stable across runs: saved files double as
    /// "already fetched" markers.
    pub fn slug(&self) -> String {
        match self {
            Scope::Day { date } => date.format("%Y-%m-%d").to_string(),
            Scope::Month { year, month } => format!("{}-{}", month_name(*month), year),
            Scope::Year { year } => year.to_string(),
            Scope::AllTime => "all-time".to_string(),
            Scope::Named { name } => name
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '-' })
                .collect(),
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Scope::Day { date } => Some(*date),
            Scope::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            Scope::Year { year } => NaiveDate::from_ymd_opt(*year, 1, 1),
            Scope::AllTime | Scope::Named { .. } => None,
        }
    }

    pub fn year_of(&self) -> Option<i32> {
        match self {
            Scope::Day { date } => Some(date.year()),
            Scope::Month { year, .. } | Scope::Year { year } => Some(*year),
            Scope::AllTime | Scope::Named { .. } => None,
        }
    }

    /// Whether a playlist scoped to `other` feeds an aggregate scoped to `self`.
    pub fn contains(&self, other: &Scope) -> bool {
        if self == other {
            return false;
        }
        match self {
            Scope::AllTime | Scope::Named { .. } => true,
            Scope::Year { year } => {
                matches!(other, Scope::Day { .. } | Scope::Month { .. })
                    && other.year_of() == Some(*year)
            }
            Scope::Month { year, month } => match other {
                Scope::Day { date } => date.year() == *year && date.month() == *month,
                _ => false,
            },
            Scope::Day { .. } => false,
        }
    }
}
