use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::store::{EmissionRecord, ParseError, Status};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        Status::parse(value).map(Self::Only)
    }

    pub fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError {
            kind: "status filter",
            value: s.to_string(),
            expected: "All, Low, Medium, High, Critical",
        })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Date,
    Category,
    Location,
    Emission,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Category => "category",
            SortKey::Location => "location",
            SortKey::Emission => "emission",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "date" => Some(Self::Date),
            // the source-type column was keyed as `type`
            "category" | "type" | "source" => Some(Self::Category),
            "location" => Some(Self::Location),
            "emission" => Some(Self::Emission),
            _ => None,
        }
    }

    fn compare(self, a: &EmissionRecord, b: &EmissionRecord) -> Ordering {
        match self {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Category => a.category.label().cmp(b.category.label()),
            SortKey::Location => a.location.cmp(&b.location),
            SortKey::Emission => a.emission.total_cmp(&b.emission),
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError {
            kind: "sort key",
            value: s.to_string(),
            expected: "date, category, location, emission",
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError {
            kind: "sort direction",
            value: s.to_string(),
            expected: "asc, desc",
        })
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Search, filter and sort selections for one viewing session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub status_filter: StatusFilter,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl ViewState {
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    /// Header click: a new key starts ascending, the current key flips.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn apply<'a>(&self, records: &'a [EmissionRecord]) -> Vec<&'a EmissionRecord> {
        compute(
            records,
            &self.search,
            self.status_filter,
            self.sort_key,
            self.direction,
        )
    }
}

fn matches_search(record: &EmissionRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.location.to_lowercase().contains(needle)
        || record.category.label().to_lowercase().contains(needle)
}

pub fn compute<'a>(
    records: &'a [EmissionRecord],
    search: &str,
    status_filter: StatusFilter,
    sort_key: SortKey,
    direction: SortDirection,
) -> Vec<&'a EmissionRecord> {
    let needle = search.to_lowercase();
    let mut visible: Vec<&EmissionRecord> = records
        .iter()
        .filter(|r| matches_search(r, &needle) && status_filter.matches(r.status))
        .collect();

    // sort_by is stable, so ties keep input order in both directions
    visible.sort_by(|a, b| match direction {
        SortDirection::Ascending => sort_key.compare(a, b),
        SortDirection::Descending => sort_key.compare(b, a),
    });
    visible
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub critical: usize,
    pub low: usize,
}

impl Summary {
    pub fn of(visible: &[&EmissionRecord]) -> Self {
        Self {
            total: visible.len(),
            critical: visible
                .iter()
                .filter(|r| r.status == Status::Critical)
                .count(),
            low: visible.iter().filter(|r| r.status == Status::Low).count(),
        }
    }
}
