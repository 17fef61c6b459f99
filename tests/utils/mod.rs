// Shared fixtures: decompiled package trees and small hand-built models

#![allow(dead_code)]

use apktriage::model::{
    GradientBoostedClassifier, IsolationForestDetector, IsolationNode, ModelMetadata, TreeNode,
};
use std::fs;
use std::path::Path;

/// Write an AndroidManifest.xml declaring the given permissions
pub fn write_manifest(root: &Path, permissions: &[&str]) {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.fixture">
"#,
    );
    for p in permissions {
        xml.push_str(&format!("    <uses-permission android:name=\"{}\"/>\n", p));
    }
    xml.push_str("    <application android:label=\"fixture\"/>\n</manifest>\n");
    fs::write(root.join("AndroidManifest.xml"), xml).unwrap();
}

/// Write a listing at `rel` (e.g. `smali/com/example/Main.smali`)
pub fn write_listing(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Primary model that always answers Benign
pub fn benign_primary(n_features: usize) -> GradientBoostedClassifier {
    GradientBoostedClassifier::new(n_features, vec![TreeNode::Leaf { value: -5.0 }])
}

/// Primary model that answers Malicious when `feature` is set
pub fn flagging_primary(n_features: usize, feature: usize) -> GradientBoostedClassifier {
    GradientBoostedClassifier::new(
        n_features,
        vec![TreeNode::Split {
            feature,
            threshold: 0.5,
            left: Box::new(TreeNode::Leaf { value: -4.0 }),
            right: Box::new(TreeNode::Leaf { value: 4.0 }),
        }],
    )
}

/// Anomaly model under which `feature` being set is an outlier
pub fn rare_feature_anomaly(n_features: usize, feature: usize) -> IsolationForestDetector {
    let tree = IsolationNode::Internal {
        feature_idx: feature,
        threshold: 0.5,
        left: Box::new(IsolationNode::Leaf { size: 255 }),
        right: Box::new(IsolationNode::Leaf { size: 1 }),
    };
    IsolationForestDetector::new(n_features, 256, vec![tree.clone(), tree.clone(), tree])
        .with_metadata(ModelMetadata::new(256).with_description("fixture forest"))
}
