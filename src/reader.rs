//! Decompiled-artifact reader
//!
//! Reads the two inputs the extractor needs from a decompiled package
//! directory: the declared permissions in `AndroidManifest.xml`, and the
//! text of every `.smali` listing underneath the root. Listing texts are
//! streamed one file at a time and never collected.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Manifest file name at the root of a decompiled package
pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// Extension of disassembled bytecode listings
pub const LISTING_EXTENSION: &str = "smali";

/// Namespace of the `android:name` attribute
pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// Errors raised while reading decompiled artifacts
///
/// None of these abort an analysis: a bad manifest degrades extraction
/// to the listing scan, and a bad listing is skipped.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("No manifest found at {0}")]
    MissingManifest(PathBuf),

    #[error("Failed to read manifest {path}: {source}")]
    UnreadableManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest {path}: {message}")]
    MalformedManifest { path: PathBuf, message: String },

    #[error("Failed to read listing {path}: {message}")]
    UnreadableListing { path: PathBuf, message: String },
}

/// A decompiled package directory
#[derive(Debug, Clone)]
pub struct DecompiledApp {
    root: PathBuf,
}

impl DecompiledApp {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Normalized permission names declared in the manifest
    pub fn read_manifest_permissions(&self) -> Result<BTreeSet<String>, ReaderError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(ReaderError::MissingManifest(path));
        }

        let xml = fs::read_to_string(&path).map_err(|source| ReaderError::UnreadableManifest {
            path: path.clone(),
            source,
        })?;

        let permissions = parse_manifest_permissions(&xml)
            .map_err(|message| ReaderError::MalformedManifest { path, message })?;
        debug!(count = permissions.len(), "parsed manifest permissions");
        Ok(permissions)
    }

    /// Fresh single-pass walk over the listing texts
    pub fn listing_texts(&self) -> ListingTexts {
        listing_texts(&self.root)
    }
}

/// Read and parse `<root>/AndroidManifest.xml`
pub fn read_manifest_permissions(root: &Path) -> Result<BTreeSet<String>, ReaderError> {
    DecompiledApp::new(root).read_manifest_permissions()
}

/// Extract normalized permission names from manifest XML
///
/// Each `uses-permission` element contributes the last `.`-separated
/// segment of its `android:name`, so `android.permission.SEND_SMS`
/// becomes `SEND_SMS`.
pub fn parse_manifest_permissions(xml: &str) -> Result<BTreeSet<String>, String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| e.to_string())?;

    let permissions = doc
        .descendants()
        .filter(|node| node.has_tag_name("uses-permission"))
        .filter_map(|node| node.attribute((ANDROID_NS, "name")))
        .filter_map(normalize_permission)
        .collect();

    Ok(permissions)
}

/// Last dotted segment of a permission identifier
pub fn normalize_permission(name: &str) -> Option<String> {
    let local = name.rsplit('.').next().unwrap_or(name).trim();
    if local.is_empty() {
        None
    } else {
        Some(local.to_string())
    }
}

/// One disassembled source unit
#[derive(Debug, Clone)]
pub struct Listing {
    pub path: PathBuf,
    pub text: String,
}

/// Lazy walk over every `.smali` file beneath a root
///
/// Directory entries are visited in file-name order. Unreadable files and
/// directories are logged, counted, and skipped.
pub struct ListingTexts {
    walker: walkdir::IntoIter,
    scanned: usize,
    skipped: usize,
}

impl ListingTexts {
    /// Listings yielded so far
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Entries skipped so far because they could not be read
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, err: ReaderError) {
        warn!("{}", err);
        self.skipped += 1;
    }
}

impl Iterator for ListingTexts {
    type Item = Listing;

    fn next(&mut self) -> Option<Listing> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    self.skip(ReaderError::UnreadableListing {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_listing(entry.path()) {
                continue;
            }

            match fs::read(entry.path()) {
                Ok(bytes) => {
                    self.scanned += 1;
                    return Some(Listing {
                        path: entry.into_path(),
                        text: String::from_utf8_lossy(&bytes).into_owned(),
                    });
                }
                Err(e) => self.skip(ReaderError::UnreadableListing {
                    path: entry.into_path(),
                    message: e.to_string(),
                }),
            }
        }
    }
}

/// Start a walk over the listings beneath `root`
pub fn listing_texts(root: &Path) -> ListingTexts {
    ListingTexts {
        walker: WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
        scanned: 0,
        skipped: 0,
    }
}

/// Name ends in `.smali`; a file named exactly `.smali` counts too
fn is_listing(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            name.as_encoded_bytes()
                .strip_suffix(LISTING_EXTENSION.as_bytes())
                .is_some_and(|stem| stem.ends_with(b"."))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
    <uses-permission android:name="android.permission.SEND_SMS"/>
    <uses-permission android:name="android.permission.INTERNET"/>
    <uses-permission android:name="com.vendor.CUSTOM"/>
    <application android:name="com.example.App">
        <service android:name="com.example.SyncService"/>
    </application>
</manifest>"#;

    #[test]
    fn test_parse_manifest_permissions() {
        let perms = parse_manifest_permissions(MANIFEST).unwrap();
        let expected: BTreeSet<String> = ["CUSTOM", "INTERNET", "SEND_SMS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(perms, expected);
    }

    #[test]
    fn test_parse_ignores_non_permission_elements() {
        let perms = parse_manifest_permissions(MANIFEST).unwrap();
        assert!(!perms.contains("App"));
        assert!(!perms.contains("SyncService"));
    }

    #[test]
    fn test_parse_requires_android_namespace() {
        let xml = r#"<manifest><uses-permission name="android.permission.SEND_SMS"/></manifest>"#;
        assert!(parse_manifest_permissions(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        assert!(parse_manifest_permissions("<manifest><uses-permission").is_err());
    }

    #[test]
    fn test_normalize_permission() {
        assert_eq!(
            normalize_permission("android.permission.READ_PHONE_STATE"),
            Some("READ_PHONE_STATE".to_string())
        );
        assert_eq!(normalize_permission("NO_DOTS"), Some("NO_DOTS".to_string()));
        assert_eq!(normalize_permission("trailing."), None);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = read_manifest_permissions(dir.path()).unwrap_err();
        let app = DecompiledApp::new(dir.path());
        match err {
            ReaderError::MissingManifest(path) => assert_eq!(path, app.manifest_path()),
            other => panic!("expected MissingManifest, got {:?}", other),
        }
    }

    #[test]
    fn test_manifest_read_through_app() {
        let dir = TempDir::new().unwrap();
        let app = DecompiledApp::new(dir.path());
        fs::write(app.manifest_path(), MANIFEST).unwrap();

        assert_eq!(app.manifest_path(), dir.path().join(MANIFEST_FILE));
        assert!(app.read_manifest_permissions().unwrap().contains("SEND_SMS"));
    }

    #[test]
    fn test_malformed_manifest_on_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "not xml <").unwrap();
        let err = read_manifest_permissions(dir.path()).unwrap_err();
        assert!(matches!(err, ReaderError::MalformedManifest { .. }));
    }

    #[test]
    fn test_listing_walk_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("smali/com/example");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("A.smali"), "invoke-virtual chmod").unwrap();
        fs::write(nested.join("B.smali"), "const-string INTERNET").unwrap();
        fs::write(nested.join("notes.txt"), "SEND_SMS").unwrap();

        let mut walk = listing_texts(dir.path());
        let texts: Vec<String> = walk.by_ref().map(|l| l.text).collect();

        assert_eq!(texts, vec!["invoke-virtual chmod", "const-string INTERNET"]);
        assert_eq!(walk.scanned(), 2);
        assert_eq!(walk.skipped(), 0);
    }

    #[test]
    fn test_is_listing_matches_name_suffix() {
        assert!(is_listing(Path::new("smali/A.smali")));
        assert!(is_listing(Path::new("smali/.smali")));
        assert!(!is_listing(Path::new("smali/A.smali.bak")));
        assert!(!is_listing(Path::new("smali/Asmali")));
        assert!(!is_listing(Path::new("smali")));
    }

    #[test]
    fn test_dot_smali_file_is_scanned() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".smali"), "chmod").unwrap();
        assert_eq!(listing_texts(dir.path()).count(), 1);
    }

    #[test]
    fn test_listing_walk_is_restartable_by_new_call() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("A.smali"), "x").unwrap();

        let app = DecompiledApp::new(dir.path());
        assert_eq!(app.listing_texts().count(), 1);
        assert_eq!(app.listing_texts().count(), 1);
    }

    #[test]
    fn test_listing_non_utf8_is_lossy() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("A.smali"), b"chmod \xff\xfe end").unwrap();

        let listing = listing_texts(dir.path()).next().unwrap();
        assert!(listing.text.contains("chmod"));
        assert!(listing.text.contains("end"));
    }

    #[test]
    fn test_listing_walk_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut walk = listing_texts(&dir.path().join("does-not-exist"));
        assert!(walk.next().is_none());
        assert_eq!(walk.skipped(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_listing_is_skipped_and_counted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("A.smali");
        fs::write(&locked, "SEND_SMS").unwrap();
        fs::write(dir.path().join("B.smali"), "chmod").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // root ignores file modes
            return;
        }

        let mut walk = listing_texts(dir.path());
        let texts: Vec<String> = walk.by_ref().map(|l| l.text).collect();

        assert_eq!(texts, vec!["chmod"]);
        assert_eq!(walk.scanned(), 1);
        assert_eq!(walk.skipped(), 1);
    }
}
