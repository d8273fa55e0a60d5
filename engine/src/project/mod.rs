//! Projectors: pure renderings of a [`DeterminationRecord`].
//!
//! | Projector | Output |
//! |-----------|--------|
//! | [`to_record`] | JSON record, sorted keys |
//! | [`to_annotated_fragment`] | Turtle fragment about one determination node |
//! | [`to_report`] | Text certificate |
//!
//! Only [`write_artifacts`] touches the filesystem.

pub mod fragment;
pub mod record;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

pub use fragment::to_annotated_fragment;
pub use record::to_record;
pub use report::to_report;

use crate::determination::DeterminationRecord;
use crate::error::{EngineError, Result};

/// Where the artifacts of a run go. `None` means the artifact is not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// JSON record.
    pub record: Option<PathBuf>,
    /// Turtle fragment.
    pub fragment: Option<PathBuf>,
    /// Text certificate.
    pub report: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Conventional names under `dir`: `determination.json`,
    /// `determination.ttl` and `determination.txt`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            record: Some(dir.join("determination.json")),
            fragment: Some(dir.join("determination.ttl")),
            report: Some(dir.join("determination.txt")),
        }
    }
}

/// Writes a text file, creating parent directories as needed.
///
/// # Errors
///
/// [`EngineError::Io`] if the directory cannot be created or the file
/// cannot be written.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders and writes the requested artifacts, returning the paths written.
///
/// # Errors
///
/// [`EngineError::Io`] on the first write that fails.
pub fn write_artifacts(record: &DeterminationRecord, paths: &ArtifactPaths) -> Result<Vec<PathBuf>> {
    let projectors: [(&Option<PathBuf>, fn(&DeterminationRecord) -> String); 3] = [
        (&paths.record, to_record),
        (&paths.fragment, to_annotated_fragment),
        (&paths.report, to_report),
    ];
    let mut written = Vec::with_capacity(projectors.len());
    for (path, project) in projectors {
        let Some(path) = path else { continue };
        write_text(path, &project(record))?;
        tracing::info!(path = %path.display(), "artifact written");
        written.push(path.clone());
    }
    Ok(written)
}
