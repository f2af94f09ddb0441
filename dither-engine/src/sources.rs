use anyhow::{Context, Result};
use glob::glob;
use std::path::PathBuf;

/// Basic statistics for an expanded input glob (debug aid).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub matched: usize,
    pub skipped: usize,
}

/// Image files matched by a glob, in sorted (frame) order.
#[derive(Debug, Clone)]
pub struct FrameSource {
    pub pattern: String,
    pub entries: Vec<PathBuf>,
    pub stats: SourceStats,
}

impl FrameSource {
    /// Expand `pattern` eagerly. Unreadable entries and non-files are skipped.
    pub fn new(pattern: &str) -> Result<Self> {
        tracing::info!(pattern = %pattern, "evaluating input glob");
        let paths = glob(pattern).with_context(|| format!("evaluating glob {pattern}"))?;
        let mut entries = Vec::new();
        let mut skipped = 0;
        for path in paths {
            match path {
                Ok(p) if p.is_file() => entries.push(p),
                Ok(_) => skipped += 1,
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "unreadable glob entry");
                    skipped += 1;
                }
            }
        }
        entries.sort();
        if entries.is_empty() {
            tracing::warn!(pattern = %pattern, "no images matched input glob");
        }
        let stats = SourceStats {
            matched: entries.len(),
            skipped,
        };
        tracing::info!(pattern = %pattern, matched = stats.matched, skipped = stats.skipped, "input glob loaded");
        Ok(Self {
            pattern: pattern.to_string(),
            entries,
            stats,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
