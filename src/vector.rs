//! Indicator vectors
//!
//! One boolean per schema column: "this feature was observed at least once
//! in the manifest or in a listing". Vectors are immutable once built;
//! mutation happens only inside the extractor's accumulator.

use crate::schema::FeatureSchema;
use serde::{Serialize, Serializer};

/// Fixed-length {0,1} vector aligned to a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorVector {
    bits: Vec<bool>,
}

impl IndicatorVector {
    /// All-zero vector for a schema
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Build from 0/1 values; anything non-zero counts as set
    pub fn from_values(values: &[u8]) -> Self {
        Self {
            bits: values.iter().map(|&v| v != 0).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// 0/1 values, schema order
    pub fn values(&self) -> Vec<u8> {
        self.bits.iter().map(|&b| u8::from(b)).collect()
    }

    /// Model input row
    pub fn to_f64(&self) -> Vec<f64> {
        self.bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
    }

    /// Names of the set columns, in schema order
    pub fn matched<'s>(&self, schema: &'s FeatureSchema) -> Vec<&'s str> {
        schema
            .iter()
            .filter(|(idx, _)| self.is_set(*idx))
            .map(|(_, name)| name)
            .collect()
    }
}

impl Serialize for IndicatorVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values().serialize(serializer)
    }
}
