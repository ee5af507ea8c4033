use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Low,
    Medium,
    High,
    Critical,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Low, Status::Medium, Status::High, Status::Critical];

    pub fn label(self) -> &'static str {
        match self {
            Status::Low => "Low",
            Status::Medium => "Medium",
            Status::High => "High",
            Status::Critical => "Critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseError {
            kind: "status",
            value: s.to_string(),
            expected: "Low, Medium, High, Critical",
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// open set: labels outside the known ones are kept verbatim
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Vehicle,
    Industrial,
    Other(String),
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::Vehicle => "Vehicle",
            Category::Industrial => "Industrial",
            Category::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Vehicle" => Category::Vehicle,
            "Industrial" => Category::Industrial,
            _ => Category::Other(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One emission observation. `status` is assigned externally and is not
/// derived from `emission`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub id: u32,
    pub date: NaiveDate,
    #[serde(alias = "type")]
    pub category: Category,
    pub emission: f64,
    pub status: Status,
    pub location: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record id {id}")]
    DuplicateId { id: u32 },

    #[error("record {id} has invalid emission {value}, expected a non-negative number")]
    InvalidEmission { id: u32, value: f64 },

    #[error("failed to read records file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse records file: {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported records file: {path} (expected .json, .yml or .yaml)")]
    UnsupportedFormat { path: String },
}

/// Read-only, ordered set of records with unique ids.
#[derive(Clone, Debug)]
pub struct RecordStore {
    records: Vec<EmissionRecord>,
}

impl RecordStore {
    pub fn from_records(records: Vec<EmissionRecord>) -> Result<Self, StoreError> {
        let mut seen: HashSet<u32> = HashSet::with_capacity(records.len());
        for r in records.iter() {
            if !seen.insert(r.id) {
                return Err(StoreError::DuplicateId { id: r.id });
            }
            if !r.emission.is_finite() || r.emission < 0.0 {
                return Err(StoreError::InvalidEmission {
                    id: r.id,
                    value: r.emission,
                });
            }
        }
        Ok(Self { records })
    }

    pub fn sample() -> Self {
        Self {
            records: sample_records(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let display = path.display().to_string();
        let lower = display.to_lowercase();
        let is_json = lower.ends_with(".json");
        let is_yaml = lower.ends_with(".yml") || lower.ends_with(".yaml");
        if !is_json && !is_yaml {
            return Err(StoreError::UnsupportedFormat { path: display });
        }

        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: display.clone(),
            source,
        })?;

        let records: Vec<EmissionRecord> = if is_json {
            serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        };

        Self::from_records(records)
    }

    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn sample_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).expect("sample dates fall within February 2026")
}

fn sample_record(
    id: u32,
    day: u32,
    category: Category,
    emission: f64,
    status: Status,
    location: &str,
) -> EmissionRecord {
    EmissionRecord {
        id,
        date: sample_date(day),
        category,
        emission,
        status,
        location: location.to_string(),
    }
}

pub fn sample_records() -> Vec<EmissionRecord> {
    use Category::{Industrial, Vehicle};
    use Status::{Critical, High, Low, Medium};

    vec![
        sample_record(1, 18, Vehicle, 12.5, High, "Mombasa Rd"),
        sample_record(2, 17, Industrial, 45.2, Critical, "Factory Zone A"),
        sample_record(3, 16, Vehicle, 4.2, Low, "Kisii Campus"),
        sample_record(4, 15, Industrial, 8.1, Medium, "Warehouse B"),
        sample_record(5, 14, Vehicle, 3.8, Low, "Nyali Bridge"),
        sample_record(6, 13, Vehicle, 18.3, Critical, "Nairobi Highway"),
        sample_record(7, 12, Industrial, 6.5, Low, "Processing Plant C"),
    ]
}
