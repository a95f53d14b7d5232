use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::domain::EvalboardError;
use crate::service::GroupAggregation;

/// Current schema version of [`AggregationReport`].
pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Canonical aggregation artifact consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregationReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub aggregations: Vec<GroupAggregation>,
}

impl AggregationReport {
    pub fn new(aggregations: Vec<GroupAggregation>) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            aggregations,
        }
    }
}

fn digest_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".digest");
    PathBuf::from(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write the report as pretty JSON plus a `<path>.digest` sidecar.
pub fn write_report_json(path: &Path, report: &AggregationReport) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("serialize aggregation report")?;
    std::fs::write(path, &json).with_context(|| format!("write {:?}", path))?;
    let sidecar = digest_path(path);
    std::fs::write(&sidecar, sha256_hex(&json)).with_context(|| format!("write {:?}", sidecar))?;
    Ok(())
}

/// Read a report written by [`write_report_json`], verifying its digest.
pub fn read_report_json(path: &Path) -> Result<AggregationReport> {
    let json = std::fs::read(path).with_context(|| format!("read {:?}", path))?;
    let sidecar = digest_path(path);
    let expected =
        std::fs::read_to_string(&sidecar).with_context(|| format!("read {:?}", sidecar))?;
    let actual = sha256_hex(&json);
    if expected.trim() != actual {
        return Err(EvalboardError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        }
        .into());
    }
    serde_json::from_slice(&json).context("parse aggregation report")
}

fn pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Render a model comparison table for PR comments and terminal output.
pub fn render_comparison_md(title: &str, rows: &[GroupAggregation]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", title));

    if rows.is_empty() {
        out.push_str("_No runs found._\n");
        return out;
    }

    out.push_str(
        "| model | K | items | pass@k | pass^k | max@k | consistency | reliability | avg score | avg latency (ms) |\n",
    );
    out.push_str("|---|---|---|---|---|---|---|---|---|---|\n");
    for row in rows {
        let r = &row.result;
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {:.1} |\n",
            row.key.model_name,
            r.k,
            r.total_items,
            pct(r.pass_at_k),
            pct(r.pass_hat_k),
            pct(r.max_at_k),
            pct(r.consistency),
            pct(r.reliability),
            pct(r.avg_score),
            r.avg_latency,
        ));
    }

    let distributions: Vec<(&str, &Vec<usize>)> = rows
        .iter()
        .filter_map(|row| {
            row.result
                .distribution
                .as_ref()
                .map(|d| (row.key.model_name.as_str(), d))
        })
        .collect();
    if !distributions.is_empty() {
        out.push_str("\n## Correct-count distribution\n\n");
        for (model, dist) in distributions {
            let slots = dist
                .iter()
                .enumerate()
                .map(|(i, n)| format!("{}/{}: {}", i, dist.len().saturating_sub(1), n))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("- {}: {}\n", model, slots));
        }
    }
    out
}
