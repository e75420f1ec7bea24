use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::matching::MatchMatrix;

use super::{EligibilityReport, OutputError};

/// The three run outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Full matrix, unknown cells included.
    Matrix,
    EligibleJson,
    EligibleCsv,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Matrix, Self::EligibleJson, Self::EligibleCsv];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Matrix => "Output.json",
            Self::EligibleJson => "EligibleTrials.json",
            Self::EligibleCsv => "EligibleTrials.csv",
        }
    }
}

/// Outcome of writing one artifact.
#[derive(Debug)]
pub struct ArtifactReport {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub result: Result<(), OutputError>,
}

impl ArtifactReport {
    pub fn is_written(&self) -> bool {
        self.result.is_ok()
    }
}

/// Write all artifacts into `dir`. Each is attempted independently: a failed
/// write is reported and never removes the others.
pub async fn write_artifacts(
    dir: &Path,
    matrix: &MatchMatrix,
    report: &EligibilityReport,
) -> Vec<ArtifactReport> {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(dir = %dir.display(), error = %e, "Cannot create output directory");
    }

    let mut reports = Vec::with_capacity(ArtifactKind::ALL.len());
    for kind in ArtifactKind::ALL {
        let path = dir.join(kind.file_name());
        let result = match render(kind, matrix, report) {
            Ok(bytes) => write_file(&path, &bytes).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => tracing::info!(artifact = kind.file_name(), path = %path.display(), "Artifact written"),
            Err(e) => tracing::error!(artifact = kind.file_name(), error = %e, "Artifact not written"),
        }
        reports.push(ArtifactReport { kind, path, result });
    }
    reports
}

fn render(kind: ArtifactKind, matrix: &MatchMatrix, report: &EligibilityReport) -> Result<Vec<u8>, OutputError> {
    Ok(match kind {
        ArtifactKind::Matrix => serde_json::to_vec_pretty(matrix)?,
        ArtifactKind::EligibleJson => report.to_json()?.into_bytes(),
        ArtifactKind::EligibleCsv => report.to_csv()?,
    })
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    tokio::fs::write(path, bytes).await.map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })
}
