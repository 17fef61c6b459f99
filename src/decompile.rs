//! Decompiler capability
//!
//! Turning an `.apk` into a manifest plus `.smali` listings is delegated to
//! an external tool. The core only consumes the resulting directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DecompileError {
    #[error("Package not found: {}", .0.display())]
    PackageNotFound(PathBuf),

    #[error("Failed to launch {}: {source}", .tool.display())]
    Launch {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}: {stderr}", .tool.display())]
    Failed {
        tool: PathBuf,
        status: String,
        stderr: String,
    },
}

/// Produces a decompiled directory from an application package
pub trait Decompiler {
    /// Decompile `package` into `output_dir` and return the decompiled root
    fn decompile(&self, package: &Path, output_dir: &Path) -> Result<PathBuf, DecompileError>;
}

/// Runs `apktool d <package> -o <output_dir> --force`
#[derive(Debug, Clone)]
pub struct ApktoolDecompiler {
    executable: PathBuf,
}

impl ApktoolDecompiler {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, package: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("d")
            .arg(package)
            .arg("-o")
            .arg(output_dir)
            .arg("--force");
        cmd
    }
}

impl Default for ApktoolDecompiler {
    fn default() -> Self {
        Self::new("apktool")
    }
}

impl Decompiler for ApktoolDecompiler {
    fn decompile(&self, package: &Path, output_dir: &Path) -> Result<PathBuf, DecompileError> {
        if !package.is_file() {
            return Err(DecompileError::PackageNotFound(package.to_path_buf()));
        }

        info!(
            "decompiling {} into {}",
            package.display(),
            output_dir.display()
        );
        let output = self
            .command(package, output_dir)
            .output()
            .map_err(|source| DecompileError::Launch {
                tool: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DecompileError::Failed {
                tool: self.executable.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("apktool finished: {}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(output_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_arguments() {
        let d = ApktoolDecompiler::new("/opt/apktool");
        let cmd = d.command(Path::new("app.apk"), Path::new("out"));

        assert_eq!(cmd.get_program(), "/opt/apktool");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["d", "app.apk", "-o", "out", "--force"]);
    }

    #[test]
    fn test_missing_package() {
        let dir = TempDir::new().unwrap();
        let err = ApktoolDecompiler::default()
            .decompile(&dir.path().join("absent.apk"), dir.path())
            .unwrap_err();
        assert!(matches!(err, DecompileError::PackageNotFound(_)));
    }

    #[test]
    fn test_missing_tool() {
        let dir = TempDir::new().unwrap();
        let apk = dir.path().join("app.apk");
        std::fs::write(&apk, b"PK").unwrap();

        let err = ApktoolDecompiler::new(dir.path().join("no-such-apktool"))
            .decompile(&apk, &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, DecompileError::Launch { .. }));
    }
}
