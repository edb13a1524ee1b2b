//! Job parameters: the immutable key-value set that identifies a job run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobParameter {
    Long(i64),
    String(String),
}

impl fmt::Display for JobParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// Sorted, immutable parameter map. Two sets are the same run identity when
/// they compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParameters {
    params: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.params.get(key)
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.params.get(key) {
            Some(JobParameter::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(JobParameter::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobParameter)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for JobParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Default)]
pub struct JobParametersBuilder {
    params: BTreeMap<String, JobParameter>,
}

impl JobParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_long(mut self, key: impl Into<String>, value: i64) -> Self {
        self.params.insert(key.into(), JobParameter::Long(value));
        self
    }

    pub fn add_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .insert(key.into(), JobParameter::String(value.into()));
        self
    }

    pub fn to_job_parameters(self) -> JobParameters {
        JobParameters {
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_sorted() {
        let params = JobParametersBuilder::new()
            .add_string("source", "csv")
            .add_long("ts", 1_700_000_000_000)
            .to_job_parameters();
        assert_eq!(params.to_string(), "{source=csv, ts=1700000000000}");
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(JobParameters::default().to_string(), "{}");
    }

    #[test]
    fn test_typed_getters() {
        let params = JobParametersBuilder::new()
            .add_long("ts", 42)
            .add_string("name", "x")
            .to_job_parameters();
        assert_eq!(params.get_long("ts"), Some(42));
        assert_eq!(params.get_long("name"), None);
        assert_eq!(params.get_string("name"), Some("x"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = JobParametersBuilder::new()
            .add_long("a", 1)
            .add_long("b", 2)
            .to_job_parameters();
        let b = JobParametersBuilder::new()
            .add_long("b", 2)
            .add_long("a", 1)
            .to_job_parameters();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let params = JobParametersBuilder::new()
            .add_long("ts", 5)
            .to_job_parameters();
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, serde_json::json!({"ts": 5}));
    }
}
