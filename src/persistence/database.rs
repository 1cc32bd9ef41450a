use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::atomic::{finalize_atomic_write, open_for_atomic_write};
use crate::cluster::Dendrogram;
use crate::dissimilarity::Dissimilarity;
use crate::graph::{DistanceOracle, Graph};
use crate::submissions::SubmissionTable;

/// The full result of one analysis run: the unit graph, its all-pairs
/// distances, the ingested submissions, their dissimilarity matrix, and the
/// dendrogram built from it (§6).
#[derive(Serialize, Deserialize)]
pub struct Database {
    graph: Graph,
    distances: DistanceOracle,
    submissions: SubmissionTable,
    dissimilarity: Dissimilarity,
    dendrogram: Dendrogram,
}

impl Database {
    pub fn new(
        graph: Graph,
        distances: DistanceOracle,
        submissions: SubmissionTable,
        dissimilarity: Dissimilarity,
        dendrogram: Dendrogram,
    ) -> Self {
        Self { graph, distances, submissions, dissimilarity, dendrogram }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn distances(&self) -> &DistanceOracle {
        &self.distances
    }

    pub fn submissions(&self) -> &SubmissionTable {
        &self.submissions
    }

    pub fn dissimilarity(&self) -> &Dissimilarity {
        &self.dissimilarity
    }

    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    /// Serializes the whole database as JSON, written atomically.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        let mut pending = open_for_atomic_write(path, force)?;
        serde_json::to_writer_pretty(&mut pending.tmp, self).context("serializing database")?;
        pending.tmp.flush().context("flushing database temp file")?;
        finalize_atomic_write(pending)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening database {}", path.display()))?;
        serde_json::from_reader(file).with_context(|| format!("parsing database {}", path.display()))
    }

    /// Exports the dendrogram's merge steps as CSV, standing in for the
    /// original pipeline's dendrogram plot (§11).
    pub fn dendrogram_csv(&self, path: &Path, force: bool) -> Result<()> {
        let pending = open_for_atomic_write(path, force)?;
        let mut writer = csv::Writer::from_writer(pending.tmp.as_file());
        writer.write_record(["cluster1", "cluster2", "height", "size"])?;
        for step in self.dendrogram.steps() {
            writer.write_record(&[
                step.cluster1.to_string(),
                step.cluster2.to_string(),
                step.height.to_string(),
                step.size.to_string(),
            ])?;
        }
        writer.flush().context("flushing dendrogram CSV")?;
        drop(writer);
        finalize_atomic_write(pending)
    }
}
