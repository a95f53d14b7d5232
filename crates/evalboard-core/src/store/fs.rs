use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{RawRun, RunStore};
use crate::domain::{EvalboardError, Result, Run};

/// File stem for `run_id`: ASCII alphanumerics, `-`, `_` and `.` are kept,
/// every other byte becomes `%XX`. Distinct ids never share a file.
fn encode_file_stem(run_id: &str) -> String {
    let mut stem = String::with_capacity(run_id.len());
    for byte in run_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push('%');
            stem.push_str(&hex::encode_upper([byte]));
        }
    }
    stem
}

/// Filesystem-backed Run Store snapshot.
///
/// Layout: `<root>/runs/<encoded run_id>.json`, one [`RawRun`] per file.
/// Listing reads every `*.json` file in that directory, whatever its name.
pub struct FsRunStore {
    runs_dir: PathBuf,
}

impl FsRunStore {
    /// Store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            runs_dir: root.as_ref().join("runs"),
        }
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(format!("{}.json", encode_file_stem(run_id)))
    }

    /// Persist a raw run record. Atomic: temp file in the same directory, then rename.
    pub fn put_run(&self, raw: &RawRun) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.runs_dir)?;
        let path = self.run_path(&raw.run_id);

        let json = serde_json::to_vec_pretty(raw)?;
        let mut tmp = NamedTempFile::new_in(&self.runs_dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        tracing::debug!(run_id = %raw.run_id, path = %path.display(), "run written");
        Ok(path)
    }

    async fn read_run(path: &Path) -> Result<Run> {
        let bytes = tokio::fs::read(path).await?;
        let raw: RawRun = serde_json::from_slice(&bytes)?;
        raw.into_run().map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "rejected run record");
            EvalboardError::from(e)
        })
    }
}

#[async_trait]
impl RunStore for FsRunStore {
    async fn list_runs(&self) -> Result<Vec<Run>> {
        let mut entries = match tokio::fs::read_dir(&self.runs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut runs: Vec<Run> = Vec::with_capacity(paths.len());
        let mut seen = HashSet::with_capacity(paths.len());
        for path in &paths {
            // one unreadable or broken file is logged and left out of the snapshot
            let run = match Self::read_run(path).await {
                Ok(run) => run,
                Err(EvalboardError::Record(_)) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable run file");
                    continue;
                }
            };
            if !seen.insert(run.run_id.clone()) {
                tracing::warn!(
                    path = %path.display(),
                    run_id = %run.run_id,
                    "duplicate run id, keeping the first file"
                );
                continue;
            }
            runs.push(run);
        }
        Ok(runs)
    }

    async fn get_run(&self, run_id: &str) -> Result<Run> {
        let path = self.run_path(run_id);
        let run = match Self::read_run(&path).await {
            Err(EvalboardError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EvalboardError::RunNotFound(run_id.to_string()));
            }
            other => other?,
        };
        if run.run_id != run_id {
            return Err(EvalboardError::RunNotFound(run_id.to_string()));
        }
        Ok(run)
    }
}
