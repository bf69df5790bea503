//! Heuristics for data-like tokens: emails, addresses, dates and times.

use regex::{Regex, RegexBuilder};

use super::datetime::{month_number, weekday_number};
use super::{FeatureDict, TokenFeature};
use crate::error::Result;
use crate::html::HtmlToken;

const EMAIL_ZONES: &str = "[a-z]{2}|aero|asia|biz|cat|com|coop|edu|gov|info|int|jobs|mil|moby|museum|name|net|org|pro|tel|travel|xxx";

const STREET_PART_TOKENS: &[&str] = &[
    "avenue", "ave", "ave.", "boulevard", "blvd", "blvd.", "street", "str.", "st.", "road", "rd",
    "rd.", "drive", "dr", "dr.", "lane", "ln", "ln.", "court", "circle", "place", "pl", "ridgeway",
    "parkway", "highway", "park", "unit", "block",
];

const ADDRESS_PART_TOKENS: &[&str] = &["suite", "floor", "p.o.", "po", "center"];

const DIRECTION_TOKENS: &[&str] = &[
    "north", "south", "east", "west", "n", "s", "e", "w", "n.", "s.", "e.", "w.", "ne", "se",
    "sw", "nw", "northeast", "southeast", "southwest", "northwest",
];

const RANGE_TOKENS: &[&str] = &["t/m", "-", "van", "tot", "from", "to"];

/// `looks_like_email`: the token contains something shaped like an email
/// address.
#[derive(Debug, Clone)]
pub struct LooksLikeEmail {
    pattern: Regex,
}

impl LooksLikeEmail {
    pub fn new() -> Result<Self> {
        let pattern = RegexBuilder::new(&format!(
            r"(\s|%20|\b)\w[\w_.\-]*@\w[\w_.\-]*\.({EMAIL_ZONES})\b"
        ))
        .case_insensitive(true)
        .build()?;
        Ok(Self { pattern })
    }
}

impl TokenFeature for LooksLikeEmail {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("looks_like_email", self.pattern.is_match(token.token()))]
            .into_iter()
            .collect()
    }
}

/// `common_street_part`, `common_address_part` and `direction`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksLikeStreetPart;

impl TokenFeature for LooksLikeStreetPart {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let lower = token.token().to_lowercase();
        let lower = lower.as_str();
        [
            ("common_street_part", STREET_PART_TOKENS.contains(&lower)),
            ("common_address_part", ADDRESS_PART_TOKENS.contains(&lower)),
            ("direction", DIRECTION_TOKENS.contains(&lower)),
        ]
        .into_iter()
        .collect()
    }
}

/// `looks_like_year`: four digits starting with `19` or `20`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksLikeYear;

impl TokenFeature for LooksLikeYear {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let t = token.token();
        let year = t.len() == 4
            && t.bytes().all(|b| b.is_ascii_digit())
            && (t.starts_with("19") || t.starts_with("20"));
        [("looks_like_year", year)].into_iter().collect()
    }
}

/// `looks_like_month`: an English or Dutch month name or abbreviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksLikeMonth;

impl TokenFeature for LooksLikeMonth {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("looks_like_month", month_number(token.token()).is_some())]
            .into_iter()
            .collect()
    }
}

/// `looks_like_time`: the token starts with `H:MM` or `H.MM`.
#[derive(Debug, Clone)]
pub struct LooksLikeTime {
    pattern: Regex,
}

impl LooksLikeTime {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"^\d{1,2}[.:]\d{2}")?,
        })
    }
}

impl TokenFeature for LooksLikeTime {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("looks_like_time", self.pattern.is_match(token.token()))]
            .into_iter()
            .collect()
    }
}

/// `looks_like_weekday`: an English or Dutch weekday name or abbreviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksLikeWeekday;

impl TokenFeature for LooksLikeWeekday {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("looks_like_weekday", weekday_number(token.token()).is_some())]
            .into_iter()
            .collect()
    }
}

/// `looks_like_range`: a word joining two ends of a range (`-`, `to`,
/// `t/m`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct LooksLikeRange;

impl TokenFeature for LooksLikeRange {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let lower = token.token().to_lowercase();
        [("looks_like_range", RANGE_TOKENS.contains(&lower.as_str()))]
            .into_iter()
            .collect()
    }
}

/// `looks_like_day_ordinal`: a token of at most four characters containing
/// `1st`, `2nd`, `3rd` or `<digits>th` anywhere (`22nd`, `15th`, `a1st`).
/// Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct LooksLikeDayOrdinal {
    pattern: Regex,
}

impl LooksLikeDayOrdinal {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"\d*1st|2nd|3rd|\d{1,2}th")?,
        })
    }
}

impl TokenFeature for LooksLikeDayOrdinal {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let t = token.token();
        let ordinal = t.chars().count() <= 4 && self.pattern.is_match(t);
        [("looks_like_day_ordinal", ordinal)].into_iter().collect()
    }
}

/// `looks_like_date_pattern`: a token of at most ten characters containing a
/// numeric `D/M/Y`, `D.M.Y` or `D-M-Y` date anywhere.
#[derive(Debug, Clone)]
pub struct LooksLikeDatePattern {
    pattern: Regex,
}

impl LooksLikeDatePattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(
                r"\d{1,2}/\d{1,2}/\d{2,4}|\d{1,2}\.\d{1,2}\.\d{2,4}|\d{1,2}-\d{1,2}-\d{2,4}",
            )?,
        })
    }
}

impl TokenFeature for LooksLikeDatePattern {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        let t = token.token();
        let date = t.chars().count() <= 10 && self.pattern.is_match(t);
        [("looks_like_date_pattern", date)].into_iter().collect()
    }
}

fn number_in(text: &str, range: std::ops::RangeInclusive<u32>) -> bool {
    text.parse::<u32>().is_ok_and(|n| range.contains(&n))
}

/// `number_looks_like_day`: an integer between 1 and 31.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberLooksLikeDay;

impl TokenFeature for NumberLooksLikeDay {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("number_looks_like_day", number_in(token.token(), 1..=31))]
            .into_iter()
            .collect()
    }
}

/// `number_looks_like_month`: an integer between 1 and 12.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberLooksLikeMonth;

impl TokenFeature for NumberLooksLikeMonth {
    fn extract(&self, token: &HtmlToken) -> FeatureDict {
        [("number_looks_like_month", number_in(token.token(), 1..=12))]
            .into_iter()
            .collect()
    }
}
