// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generated files and the writer that persists them.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use weft_spec::syntax::GENERATED_SUFFIX;

use crate::error::WriteError;

/// The generated text of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Output path relative to the module root.
    pub path: PathBuf,
    /// Package the artifact was generated for.
    pub package: String,
    /// File contents.
    pub text: String,
}

impl Artifact {
    /// Artifact for `package`, placed next to its source in `source_dir`.
    pub fn new(source_dir: &str, package: &str, text: String) -> Self {
        Self {
            path: Self::output_path(source_dir, package),
            package: package.to_string(),
            text,
        }
    }

    /// `<source_dir>/<package>.gen.rs`.
    pub fn output_path(source_dir: &str, package: &str) -> PathBuf {
        let file = format!("{}{}", package, GENERATED_SUFFIX);
        if source_dir.is_empty() {
            PathBuf::from(file)
        } else {
            Path::new(source_dir).join(file)
        }
    }

    /// SHA-256 of the text, hex encoded.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// How artifacts are written.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Run `rustfmt` on every written file.
    pub rustfmt: bool,
}

/// Writes `artifacts` under `root`, creating parent directories.
///
/// A file whose contents already match is left untouched. Returns the full
/// paths of all artifacts, written or not, in input order. Formatting
/// failures are logged and never fail the write.
pub fn write_artifacts(
    root: &Path,
    artifacts: &[Artifact],
    options: &WriteOptions,
) -> Result<Vec<PathBuf>, WriteError> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = root.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let unchanged = fs::read(&path).is_ok_and(|existing| existing == artifact.text.as_bytes());
        if unchanged {
            debug!(path = %path.display(), "Artifact unchanged");
        } else {
            fs::write(&path, &artifact.text).map_err(|source| WriteError::Write {
                path: path.clone(),
                source,
            })?;
            info!(
                path = %path.display(),
                package = %artifact.package,
                checksum = %artifact.checksum(),
                bytes = artifact.text.len(),
                "Wrote artifact"
            );
            if options.rustfmt {
                rustfmt(&path);
            }
        }
        written.push(path);
    }

    Ok(written)
}

fn rustfmt(path: &Path) {
    match Command::new("rustfmt").arg("--edition=2024").arg(path).output() {
        Ok(output) if output.status.success() => {
            debug!(path = %path.display(), "Formatted artifact");
        }
        Ok(output) => warn!(
            path = %path.display(),
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "rustfmt failed; leaving artifact unformatted"
        ),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Could not run rustfmt; leaving artifact unformatted"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            Artifact::output_path("src/orders", "orders"),
            PathBuf::from("src/orders/orders.gen.rs")
        );
        assert_eq!(
            Artifact::output_path("", "billing"),
            PathBuf::from("billing.gen.rs")
        );
    }

    #[test]
    fn test_write_creates_directories_and_skips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new("src/orders", "orders", "pub const A: u8 = 1;\n".to_string());

        let paths = write_artifacts(dir.path(), &[artifact.clone()], &WriteOptions::default())
            .unwrap();
        assert_eq!(paths, [dir.path().join("src/orders/orders.gen.rs")]);
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), artifact.text);

        let before = fs::metadata(&paths[0]).unwrap().modified().unwrap();
        write_artifacts(dir.path(), &[artifact], &WriteOptions::default()).unwrap();
        let after = fs::metadata(&paths[0]).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_write_replaces_stale_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("billing.gen.rs"), "stale stale stale stale").unwrap();

        let artifact = Artifact::new("", "billing", "fresh\n".to_string());
        write_artifacts(dir.path(), &[artifact], &WriteOptions::default()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("billing.gen.rs")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = Artifact::new("", "p", "x".to_string());
        let b = Artifact::new("src", "p", "x".to_string());
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 64);
    }
}
