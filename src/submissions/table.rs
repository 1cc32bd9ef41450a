use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::graph::{Graph, UnitId};

/// The three leading metadata columns every submission file carries (§6),
/// preserved verbatim rather than interpreted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub id: String,
    pub submission_id: String,
    pub datetime: String,
}

/// Rows = submissions, each row a bit-vector over the graph's internal unit
/// indices, plus preserved metadata columns (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionTable {
    metadata: Vec<SubmissionMetadata>,
    tiles: Array2<bool>,
}

impl SubmissionTable {
    /// Ingest the *wide boolean* format: three leading metadata columns
    /// followed by one boolean column per unit, headered by the unit's
    /// external id.
    pub fn ingest_wide(path: &Path, graph: &Graph) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening submission file {}", path.display()))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers().context("reading submission file header")?.clone();
        if headers.len() < 3 {
            return Err(AnalysisError::InputFormat(
                "wide submission file needs at least 3 leading metadata columns".into(),
            )
            .into());
        }

        let unit_columns: Vec<Option<usize>> = headers
            .iter()
            .skip(3)
            .map(|header| graph.index_of(&UnitId::from(header.to_string())))
            .collect();

        let mut metadata = Vec::new();
        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for result in reader.records() {
            let record = result.map_err(|e| AnalysisError::InputFormat(format!("malformed submission row: {e}")))?;
            metadata.push(read_metadata(&record));

            let mut row = vec![false; graph.node_count()];
            for (offset, cell) in record.iter().skip(3).enumerate() {
                if !is_truthy(cell) {
                    continue;
                }
                match unit_columns.get(offset).copied().flatten() {
                    Some(index) => row[index] = true,
                    None => dropped += 1,
                }
            }
            rows.push(row);
        }

        warn_dropped_tiles(dropped);
        Self::from_rows(metadata, rows, graph.node_count())
    }

    /// Ingest the *compressed* format: three leading metadata columns plus
    /// one column (`tiles_column`) holding a sequence literal of unit ids.
    pub fn ingest_compressed(path: &Path, graph: &Graph, tiles_column: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening submission file {}", path.display()))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers().context("reading submission file header")?.clone();
        let tiles_index = headers.iter().position(|h| h == tiles_column).ok_or_else(|| {
            AnalysisError::SchemaMismatch(format!("submission file has no '{tiles_column}' column"))
        })?;

        let mut metadata = Vec::new();
        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for result in reader.records() {
            let record = result.map_err(|e| AnalysisError::InputFormat(format!("malformed submission row: {e}")))?;
            metadata.push(read_metadata(&record));

            let literal = record.get(tiles_index).unwrap_or_default();
            let tile_ids = parse_tile_literal(literal)?;

            let mut row = vec![false; graph.node_count()];
            for tile in tile_ids {
                match graph.index_of(&UnitId::from(tile)) {
                    Some(index) => row[index] = true,
                    None => dropped += 1,
                }
            }
            rows.push(row);
        }

        warn_dropped_tiles(dropped);
        Self::from_rows(metadata, rows, graph.node_count())
    }

    fn from_rows(metadata: Vec<SubmissionMetadata>, rows: Vec<Vec<bool>>, v: usize) -> Result<Self> {
        if metadata.is_empty() {
            return Err(AnalysisError::EmptyInput("no submissions remained after ingest".into()).into());
        }

        let n = rows.len();
        let mut tiles = Array2::<bool>::from_elem((n, v), false);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, present) in row.into_iter().enumerate() {
                tiles[[i, j]] = present;
            }
        }

        Ok(Self { metadata, tiles })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    #[inline]
    pub fn num_units(&self) -> usize {
        self.tiles.ncols()
    }

    pub fn metadata(&self) -> &[SubmissionMetadata] {
        &self.metadata
    }

    pub fn tiles(&self) -> &Array2<bool> {
        &self.tiles
    }

    /// The unit indices present in submission `i`, in ascending order.
    pub fn tile_indices(&self, i: usize) -> Vec<usize> {
        self.tiles.row(i).iter().enumerate().filter_map(|(j, &present)| present.then_some(j)).collect()
    }

    /// Write `self.metadata()` plus an appended `cluster` column to a CSV
    /// file (§4.4: "return the submission-metadata table with an extra
    /// column holding the label assigned to each submission").
    pub fn write_labeled_csv(&self, labels: &[usize], path: &Path) -> Result<()> {
        assert_eq!(labels.len(), self.len(), "labels.len() must equal number of submissions");

        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["id", "submission_id", "datetime", "cluster"])?;
        for (row, &label) in self.metadata.iter().zip(labels) {
            writer.write_record([row.id.as_str(), row.submission_id.as_str(), row.datetime.as_str(), &label.to_string()])?;
        }
        writer.flush().context("flushing labeled submission CSV")?;
        Ok(())
    }
}

fn read_metadata(record: &csv::StringRecord) -> SubmissionMetadata {
    SubmissionMetadata {
        id: record.get(0).unwrap_or_default().to_string(),
        submission_id: record.get(1).unwrap_or_default().to_string(),
        datetime: record.get(2).unwrap_or_default().to_string(),
    }
}

fn warn_dropped_tiles(dropped: usize) {
    if dropped > 0 {
        eprintln!("warning: dropped {dropped} tile reference(s) for units absent from the graph");
    }
}

fn is_truthy(cell: &str) -> bool {
    !matches!(cell.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no")
}

/// Parses a "sequence literal" of unit ids, tolerating both Python-repr
/// lists (`['001', '002']`) and JSON arrays (`["001", "002"]`).
fn parse_tile_literal(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| AnalysisError::InputFormat(format!("tile sequence literal missing brackets: {text}")))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(inner
        .split(',')
        .map(|piece| piece.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .collect())
}
