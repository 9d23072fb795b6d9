//! Experience inference from year mentions.
//!
//! Resume side: every 4-digit `20xx` year (explicit or inside a
//! `YYYY-YYYY` / `YYYY–YYYY` range) goes into a [`YearSet`]; experience is
//! the span between the earliest and latest year, in months.
//!
//! Job-description side: an optional "N+ years" requirement scan.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

static YEAR_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})[–-](20\d{2})\b").expect("range pattern is valid"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("year pattern is valid"));

static REQUIRED_YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b").expect("requirement pattern is valid")
});

/// Distinct `20xx` years mentioned in a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearSet(BTreeSet<u32>);

impl YearSet {
    pub fn from_text(text: &str) -> Self {
        let mut years = BTreeSet::new();

        for caps in YEAR_RANGE_RE.captures_iter(text) {
            if let (Some(start), Some(end)) = (parse_year(&caps, 1), parse_year(&caps, 2)) {
                // A reversed range expands to nothing.
                years.extend(start..=end);
            }
        }
        for caps in YEAR_RE.captures_iter(text) {
            if let Some(year) = parse_year(&caps, 1) {
                years.insert(year);
            }
        }

        Self(years)
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(max - min) * 12`, or 0 for an empty set.
    pub fn span_months(&self) -> u32 {
        let mut years = self.years();
        match (years.next(), years.next_back()) {
            (Some(min), Some(max)) => (max - min) * 12,
            _ => 0,
        }
    }
}

fn parse_year(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExperienceSignal {
    pub total_months: u32,
}

impl ExperienceSignal {
    pub fn whole_years(&self) -> u32 {
        self.total_months / 12
    }
}

/// Experience span of `text` in months. Run it on the resume with the
/// education block already stripped.
pub fn estimate_experience(text: &str) -> ExperienceSignal {
    let years = YearSet::from_text(text);
    if years.is_empty() {
        debug!("No four-digit years found in resume text");
    }
    ExperienceSignal {
        total_months: years.span_months(),
    }
}

/// Largest "N years" / "N+ yrs" requirement stated in a job description.
pub fn required_years_from_text(text: &str) -> Option<u32> {
    REQUIRED_YEARS_RE
        .captures_iter(text)
        .filter_map(|caps| parse_year(&caps, 1))
        .max()
}
