use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;

use crate::atomic::{finalize_atomic_write, open_for_atomic_write};
use crate::cli::{ChainArgs, ChainMode, Cli};
use crate::markov::{geo_chain, geo_semantic_chain, semantic_chain};

/// Constructs and iterates a Markov chain over a distance and/or similarity
/// matrix, writing the final cluster assignment (§6 caller API item 6).
pub fn run(cli: &Cli, args: &ChainArgs) -> Result<()> {
    let distance_matrix = args.distance_matrix.as_deref().map(load_square_matrix).transpose()?;
    let similarity_matrix = args.similarity_matrix.as_deref().map(load_square_matrix).transpose()?;

    let mut chain = match args.mode {
        ChainMode::Geo => {
            let distances = distance_matrix.ok_or_else(|| anyhow!("geo mode requires --distance-matrix"))?;
            geo_chain(distances, args.beta, args.clusters, args.length, args.seed)
        }
        ChainMode::Semantic => {
            let similarities = similarity_matrix.ok_or_else(|| anyhow!("semantic mode requires --similarity-matrix"))?;
            semantic_chain(similarities, args.beta, args.clusters, args.length, args.seed)
        }
        ChainMode::GeoSemantic => {
            let distances = distance_matrix.ok_or_else(|| anyhow!("geo-semantic mode requires --distance-matrix"))?;
            let similarities =
                similarity_matrix.ok_or_else(|| anyhow!("geo-semantic mode requires --similarity-matrix"))?;
            geo_semantic_chain(distances, similarities, args.beta, args.clusters, args.length, args.seed)
        }
    };

    while let Some(_previous) = chain.next() {
        if cli.verbose > 1 {
            eprintln!("[chain] step {}/{}", chain.step(), args.length);
        }
    }

    let assignment = chain.state().assignment().to_vec();
    write_assignment_csv(&assignment, &args.output, args.force)?;
    println!("Wrote {} cluster assignments -> {}", assignment.len(), args.output.display());
    Ok(())
}

fn write_assignment_csv(assignment: &[usize], path: &Path, force: bool) -> Result<()> {
    let pending = open_for_atomic_write(path, force)?;
    let mut writer = csv::Writer::from_writer(pending.tmp.as_file());
    writer.write_record(["submission_index", "cluster"])?;
    for (index, &cluster) in assignment.iter().enumerate() {
        writer.write_record(&[index.to_string(), cluster.to_string()])?;
    }
    writer.flush().context("flushing assignment CSV")?;
    drop(writer);
    finalize_atomic_write(pending)
}

/// Loads a square comma-delimited textual matrix (the distance-cache format
/// of §6, reused for the similarity matrix since the core places no
/// additional format requirement on it).
fn load_square_matrix(path: &Path) -> Result<Array2<f64>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading matrix file {}", path.display()))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(',')
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow!("matrix cell '{cell}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let n = rows.len();
    if rows.iter().any(|row| row.len() != n) {
        bail!("matrix file {} is not square ({n} rows)", path.display());
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, n), flat).map_err(|e| anyhow!("matrix shape error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn loads_square_matrix_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "0,1,2").unwrap();
        writeln!(file, "1,0,1").unwrap();
        writeln!(file, "2,1,0").unwrap();
        drop(file);

        let matrix = load_square_matrix(&path).unwrap();
        assert_eq!(matrix.dim(), (3, 3));
        assert_eq!(matrix[[0, 1]], 1.0);
    }

    #[test]
    fn rejects_non_square_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "0,1").unwrap();
        writeln!(file, "1,0").unwrap();
        writeln!(file, "0,1,2").unwrap();
        drop(file);

        assert!(load_square_matrix(&path).is_err());
    }
}
