//! CLI argument parsing for apktriage

use crate::config::TriageConfig;
use crate::matcher::MatcherKind;
use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "apktriage")]
#[command(version)]
#[command(about = "Static malware triage for Android packages", long_about = None)]
pub struct Cli {
    /// APK file to decompile, or an already decompiled directory
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Primary model artifact (.apr or .json)
    #[arg(long = "primary-model", value_name = "FILE")]
    pub primary_model: Option<PathBuf>,

    /// Anomaly model artifact (.apr or .json)
    #[arg(long = "anomaly-model", value_name = "FILE")]
    pub anomaly_model: Option<PathBuf>,

    /// apktool executable
    #[arg(long = "apktool", value_name = "PATH")]
    pub apktool: Option<PathBuf>,

    /// Directory packages are decompiled into
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Token matching strategy for the listing scan
    #[arg(long = "matcher", value_enum)]
    pub matcher: Option<MatcherKind>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Extract and print the indicator vector without loading models
    #[arg(long = "extract-only")]
    pub extract_only: bool,

    /// List every matched feature and where it was found
    #[arg(long = "show-features")]
    pub show_features: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a file (or default) config
    pub fn apply_overrides(&self, mut config: TriageConfig) -> TriageConfig {
        if let Some(path) = &self.primary_model {
            config.primary_model = path.clone();
        }
        if let Some(path) = &self.anomaly_model {
            config.anomaly_model = path.clone();
        }
        if let Some(path) = &self.apktool {
            config.apktool = path.clone();
        }
        if let Some(path) = &self.work_dir {
            config.work_dir = path.clone();
        }
        if let Some(matcher) = self.matcher {
            config.matcher = matcher;
        }
        config
    }
}
