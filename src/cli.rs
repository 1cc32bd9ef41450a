use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Community-of-Interest map analysis: dissimilarity, clustering, and
/// Markov-chain refinement over citizen-submitted COI maps (§6).
#[derive(Parser, Debug)]
#[command(name = "coi-analysis", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the analysis database from a graph and a submission file.
    Build(BuildArgs),
    /// Cut a built database's dendrogram into labeled clusters.
    Cluster(ClusterArgs),
    /// Run the Markov-chain refiner over a distance and/or similarity matrix.
    Chain(ChainArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Node-link adjacency JSON describing the unit graph.
    pub graph: PathBuf,

    /// Wide-boolean or compressed submission file.
    pub submissions: PathBuf,

    /// Where to write the built analysis database.
    pub output: PathBuf,

    /// Attribute on each adjacency node holding its external unit id.
    #[arg(long, default_value = "GEOID10")]
    pub id_attribute: String,

    /// Column holding the tile-sequence literal, for `--compressed` input.
    #[arg(long, default_value = "tiles")]
    pub tiles_column: String,

    /// Submission file uses the compressed tile-list format rather than
    /// wide boolean columns.
    #[arg(long)]
    pub compressed: bool,

    /// Pre-computed distance-matrix cache to load instead of recomputing
    /// all-pairs BFS. Falls back to recomputation if dimensions mismatch.
    #[arg(long)]
    pub distance_cache: Option<PathBuf>,

    /// Where to save the (possibly just-computed) distance matrix cache.
    #[arg(long)]
    pub save_distance_cache: Option<PathBuf>,

    /// Worker threads for the dissimilarity sweep.
    #[arg(long, default_value_t = 1)]
    pub cpus: usize,

    /// Overwrite the output database if it already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Analysis database produced by `build`.
    pub database: PathBuf,

    /// Where to write the labeled submission-metadata CSV.
    pub output: PathBuf,

    #[command(subcommand)]
    pub cut: ClusterCut,

    /// Overwrite the output file if it already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum ClusterCut {
    /// Cut at a given dendrogram height.
    Threshold { height: f64 },
    /// Cut to (at most) a given number of clusters.
    Count { k: usize },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum ChainMode {
    /// Minimize intracluster graph distance only.
    Geo,
    /// Maximize intracluster semantic similarity only.
    Semantic,
    /// Minimize distance and maximize similarity together.
    GeoSemantic,
}

#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Distance-matrix cache (comma-delimited integers, §6) to refine
    /// against. Required for `geo` and `geo-semantic` modes.
    #[arg(long)]
    pub distance_matrix: Option<PathBuf>,

    /// Semantic-similarity matrix, same textual format as the distance
    /// cache. Required for `semantic` and `geo-semantic` modes.
    #[arg(long)]
    pub similarity_matrix: Option<PathBuf>,

    /// Which refinement mode to run.
    #[arg(long, value_enum, default_value_t = ChainMode::Geo)]
    pub mode: ChainMode,

    /// Metropolis pickiness parameter; larger values reject worsening moves
    /// more readily.
    #[arg(long, default_value_t = 1.0)]
    pub beta: f64,

    /// Number of clusters to partition submissions into.
    #[arg(short = 'k', long)]
    pub clusters: usize,

    /// Number of Metropolis steps to run.
    #[arg(long, default_value_t = 10_000)]
    pub length: usize,

    /// Seed for the chain's pseudo-random stream; fixing it reproduces a
    /// bit-identical run (§5).
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Where to write the final assignment (one `cluster` column, one row
    /// per submission index).
    pub output: PathBuf,

    /// Overwrite the output file if it already exists.
    #[arg(long)]
    pub force: bool,
}
