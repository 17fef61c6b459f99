//! Feature schema: the ordered catalog of indicators
//!
//! The schema defines the dimensionality and column order of every
//! indicator vector. Models are trained against one exact catalog, so the
//! order here is part of the model contract: column `i` of a vector always
//! means `names()[i]`.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

/// Built-in Android catalog (permissions, API signatures, literal strings)
const ANDROID_FEATURES: &[&str] = &[
    "SEND_SMS",
    "INTERNET",
    "WRITE_HISTORY_BOOKMARKS",
    "TelephonyManager.getSubscriberId",
    "TelephonyManager.getDeviceId",
    "GET_ACCOUNTS",
    "chmod",
    "android.telephony.gsm.SmsManager",
    "TelephonyManager.getLine1Number",
    "Ljava.net.URLDecoder",
    "android.intent.action.BOOT_COMPLETED",
    "READ_PHONE_STATE",
    "CHANGE_NETWORK_STATE",
    "WRITE_EXTERNAL_STORAGE",
    "Ljava.lang.Object.getClass",
    "Ljava.lang.Class.getCanonicalName",
    "ACCESS_COARSE_LOCATION",
    "android.content.pm.PackageInfo",
    "Ljava.lang.Class.cast",
    "onBind",
    "findClass",
    "WRITE_SETTINGS",
    "HttpGet.init",
    "ClassLoader",
];

/// Errors raised while constructing a schema
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Feature schema is empty")]
    Empty,

    #[error("Feature at index {0} has an empty name")]
    EmptyName(usize),

    #[error("Duplicate feature name: {0}")]
    Duplicate(String),
}

/// Ordered, immutable catalog of feature names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from an ordered list of unique names
    pub fn new<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::EmptyName(idx));
            }
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// The catalog the shipped models were trained on
    pub fn android() -> Self {
        Self {
            names: ANDROID_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed schema; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Column of a feature, by exact name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterate `(column, name)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    /// Hex SHA-256 over the ordered names
    ///
    /// Names are NUL-separated so that `["ab", "c"]` and `["a", "bc"]`
    /// hash differently.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in &self.names {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::android()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_catalog_shape() {
        let schema = FeatureSchema::android();
        assert_eq!(schema.len(), 24);
        assert_eq!(schema.name(0), Some("SEND_SMS"));
        assert_eq!(schema.name(23), Some("ClassLoader"));
        assert_eq!(schema.index_of("chmod"), Some(6));
    }

    #[test]
    fn test_android_catalog_passes_validation() {
        let rebuilt = FeatureSchema::new(ANDROID_FEATURES.iter().copied()).unwrap();
        assert_eq!(rebuilt, FeatureSchema::android());
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let err = FeatureSchema::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, SchemaError::Empty);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = FeatureSchema::new(["INTERNET", "SEND_SMS", "INTERNET"]).unwrap_err();
        assert_eq!(err, SchemaError::Duplicate("INTERNET".to_string()));
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = FeatureSchema::new(["INTERNET", ""]).unwrap_err();
        assert_eq!(err, SchemaError::EmptyName(1));
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = FeatureSchema::new(["SEND_SMS", "INTERNET"]).unwrap();
        let b = FeatureSchema::new(["INTERNET", "SEND_SMS"]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_separates_names() {
        let a = FeatureSchema::new(["ab", "c"]).unwrap();
        let b = FeatureSchema::new(["a", "bc"]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
