use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Saved genotype parameter vectors, fittest first. Serialized as a bare JSON array of
/// float arrays with no header, so loading it is only meaningful for the same topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub Vec<Vec<f64>>);

impl Snapshot {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.0
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

impl From<Vec<Vec<f64>>> for Snapshot {
    fn from(vectors: Vec<Vec<f64>>) -> Self {
        Self(vectors)
    }
}
