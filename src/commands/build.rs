use anyhow::Result;

use crate::cli::{BuildArgs, Cli};
use crate::cluster::Dendrogram;
use crate::dissimilarity::Dissimilarity;
use crate::graph::{DistanceOracle, Graph};
use crate::persistence::Database;
use crate::submissions::SubmissionTable;

/// Builds the full analysis database: graph, distance oracle, submission
/// table, dissimilarity matrix, and dendrogram (§6 caller API item 1).
pub fn run(cli: &Cli, args: &BuildArgs) -> Result<()> {
    if cli.verbose > 0 {
        eprintln!("[build] graph={} submissions={}", args.graph.display(), args.submissions.display());
    }

    let graph = Graph::load(&args.graph, &args.id_attribute)?;
    if cli.verbose > 0 {
        eprintln!("[build] loaded graph: {} units, {} edges", graph.node_count(), graph.edge_count());
    }

    let distances = match &args.distance_cache {
        Some(path) => match DistanceOracle::load_cache(path, graph.node_count()) {
            Ok(oracle) => {
                if cli.verbose > 0 {
                    eprintln!("[build] loaded distance cache from {}", path.display());
                }
                oracle
            }
            Err(err) => {
                eprintln!("warning: distance cache at {} unusable ({err:#}); recomputing", path.display());
                DistanceOracle::build(&graph)
            }
        },
        None => DistanceOracle::build(&graph),
    };

    if let Some(path) = &args.save_distance_cache {
        distances.save_cache(path)?;
        if cli.verbose > 0 {
            eprintln!("[build] saved distance cache to {}", path.display());
        }
    }

    let submissions = if args.compressed {
        SubmissionTable::ingest_compressed(&args.submissions, &graph, &args.tiles_column)?
    } else {
        SubmissionTable::ingest_wide(&args.submissions, &graph)?
    };
    if cli.verbose > 0 {
        eprintln!("[build] ingested {} submissions", submissions.len());
    }

    let dissimilarity = Dissimilarity::compute_with_threads(&submissions, &distances, args.cpus.max(1));
    let dendrogram = Dendrogram::complete_linkage(submissions.len(), &sanitized_condensed(&dissimilarity, &distances));

    let database = Database::new(graph, distances, submissions, dissimilarity, dendrogram);
    database.save(&args.output, args.force)?;
    println!("Wrote database -> {}", args.output.display());
    Ok(())
}

/// Replaces sentinel/NaN/infinite entries with `2 * (V + 1)` at the
/// clustering boundary (§4.3, §7 NumericSentinel), keeping unreachable pairs
/// strictly larger than any real pair without breaking the condensed-vector
/// conversion the clusterer requires. The dissimilarity sentinel is itself a
/// finite `V + 1` value (propagated straight from the distance oracle), so
/// `is_finite()` alone can't distinguish it from a real pair — anything at or
/// above the oracle's sentinel is treated as unreachable, alongside any
/// literal NaN/infinity a future score function might produce.
fn sanitized_condensed(dissimilarity: &Dissimilarity, distances: &DistanceOracle) -> Vec<f64> {
    let sentinel = distances.sentinel() as f64;
    let substitute = 2.0 * sentinel;
    dissimilarity
        .condensed()
        .into_iter()
        .map(|value| if value.is_finite() && value < sentinel { value } else { substitute })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UnitId;
    use std::io::Write;

    #[test]
    fn sanitized_condensed_substitutes_sentinels() {
        let unit_ids = vec![UnitId::from("0"), UnitId::from("1"), UnitId::from("2"), UnitId::from("3")];
        let edges = vec![vec![1u32], vec![0u32], vec![3u32], vec![2u32]];
        let graph = Graph::from_adjacency(unit_ids, edges);
        let distances = DistanceOracle::build(&graph);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,submission_id,datetime,0,1,2,3").unwrap();
        writeln!(file, "a,s1,2020-01-01,1,0,0,0").unwrap();
        writeln!(file, "b,s2,2020-01-02,0,0,1,0").unwrap();
        drop(file);

        let submissions = SubmissionTable::ingest_wide(&path, &graph).unwrap();
        let dissimilarity = Dissimilarity::compute(&submissions, &distances);
        let condensed = sanitized_condensed(&dissimilarity, &distances);
        assert_eq!(condensed, vec![2.0 * distances.sentinel() as f64]);
    }
}
