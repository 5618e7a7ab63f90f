//! Sample metadata and environmental category assignment.

use crate::error::{CooccurError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical level, e.g. an environment or habitat label.
    Categorical(String),
    /// Numeric measurement.
    Continuous(f64),
    Missing,
}

impl Variable {
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }
}

/// Inferred type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("na")
}

/// Per-sample variables, keyed by sample id.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    sample_ids: Vec<String>,
    column_names: Vec<String>,
    data: HashMap<String, HashMap<String, Variable>>,
    column_types: HashMap<String, VariableType>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build metadata holding a single categorical column.
    ///
    /// Convenient when category labels come from somewhere other than a file.
    pub fn from_categories<S: AsRef<str>>(column: &str, assignments: &[(S, S)]) -> Self {
        let mut meta = Self::new();
        meta.column_names.push(column.to_string());
        meta.column_types
            .insert(column.to_string(), VariableType::Categorical);
        for (sample, level) in assignments {
            let sample = sample.as_ref().to_string();
            let level = level.as_ref();
            let value = if is_missing_token(level) {
                Variable::Missing
            } else {
                Variable::Categorical(level.to_string())
            };
            meta.sample_ids.push(sample.clone());
            meta.data
                .entry(sample)
                .or_default()
                .insert(column.to_string(), value);
        }
        meta
    }

    /// Load metadata from a tab-separated file.
    ///
    /// The first column holds sample ids. A column is continuous when every
    /// non-missing value parses as a number, otherwise categorical. Empty cells
    /// and `NA` are missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        if header.len() < 2 {
            return Err(CooccurError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

        let mut raw_rows: Vec<(String, Vec<String>)> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let Some(sample_id) = record.get(0) else {
                continue;
            };
            if sample_id.trim().is_empty() {
                continue;
            }
            let values = record.iter().skip(1).map(|s| s.trim().to_string()).collect();
            raw_rows.push((sample_id.to_string(), values));
        }

        if raw_rows.is_empty() {
            return Err(CooccurError::EmptyData("No samples in metadata".to_string()));
        }

        let column_types: HashMap<String, VariableType> = column_names
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let numeric = raw_rows.iter().all(|(_, values)| {
                    values
                        .get(col)
                        .map(|v| is_missing_token(v) || v.parse::<f64>().is_ok())
                        .unwrap_or(true)
                });
                let ty = if numeric {
                    VariableType::Continuous
                } else {
                    VariableType::Categorical
                };
                (name.clone(), ty)
            })
            .collect();

        let mut sample_ids = Vec::with_capacity(raw_rows.len());
        let mut data = HashMap::with_capacity(raw_rows.len());
        for (sample_id, values) in raw_rows {
            if data.contains_key(&sample_id) {
                return Err(CooccurError::SampleMismatch(format!(
                    "Duplicate sample '{}' in metadata",
                    sample_id
                )));
            }
            let row: HashMap<String, Variable> = column_names
                .iter()
                .enumerate()
                .map(|(col, name)| {
                    let value = match values.get(col).map(String::as_str) {
                        None => Variable::Missing,
                        Some(raw) if is_missing_token(raw) => Variable::Missing,
                        Some(raw) => match column_types[name] {
                            VariableType::Continuous => raw
                                .parse::<f64>()
                                .map(Variable::Continuous)
                                .unwrap_or(Variable::Missing),
                            VariableType::Categorical => Variable::Categorical(raw.to_string()),
                        },
                    };
                    (name.clone(), value)
                })
                .collect();
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, row);
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|row| row.get(column))
    }

    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_types.contains_key(column)
    }

    /// Group sample ids by the levels of a column.
    ///
    /// Categories come back in lexical order and samples keep their metadata
    /// order. Samples with a missing value are left out of every group. A
    /// numeric column (site codes such as 1, 2, 3) is grouped by the printed
    /// value, so `1` and `1.0` are the same level.
    pub fn groups(&self, column: &str) -> Result<BTreeMap<String, Vec<String>>> {
        if !self.has_column(column) {
            return Err(CooccurError::MissingColumn(column.to_string()));
        }

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for sample_id in &self.sample_ids {
            let level = match self.get(sample_id, column) {
                Some(Variable::Categorical(level)) => level.clone(),
                Some(Variable::Continuous(value)) => value.to_string(),
                Some(Variable::Missing) | None => continue,
            };
            groups.entry(level).or_default().push(sample_id.clone());
        }
        Ok(groups)
    }
}
