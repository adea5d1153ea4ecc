use serde::Serialize;

use crate::error::RunnerError;

/// Delimiter between parameters in the raw `--job_params` string.
pub const PARAM_DELIMITER: char = ';';

/// Split a raw parameter string into the ordered parameter sequence.
///
/// An empty input yields one empty parameter, not an empty sequence.
pub fn split_params(raw: &str) -> Vec<String> {
    raw.split(PARAM_DELIMITER).map(str::to_string).collect()
}

/// The job to run and its parameters, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    name: String,
    params: Vec<String>,
}

impl JobDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Result<Self, RunnerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RunnerError::EmptyJobName);
        }
        Ok(Self { name, params })
    }

    /// Build a descriptor from the `--job_name` / `--job_params` pair.
    pub fn from_cli(name: &str, raw_params: &str) -> Result<Self, RunnerError> {
        Self::new(name, split_params(raw_params))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}
