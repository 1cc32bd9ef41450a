use anyhow::{bail, Result};

use crate::cli::{Cli, ClusterArgs, ClusterCut};
use crate::cluster::{cut_by_count, cut_by_height};
use crate::persistence::Database;

/// Loads a built database and cuts its dendrogram by height or by target
/// cluster count, writing the labeled submission-metadata table (§6 caller
/// API items 4-5).
pub fn run(cli: &Cli, args: &ClusterArgs) -> Result<()> {
    if !args.force && args.output.exists() {
        bail!("refusing to overwrite existing file: {} (pass --force to overwrite)", args.output.display());
    }

    let database = Database::load(&args.database)?;
    if cli.verbose > 0 {
        eprintln!("[cluster] loaded database with {} submissions", database.submissions().len());
    }

    let labels = match args.cut {
        ClusterCut::Threshold { height } => cut_by_height(database.dendrogram(), height),
        ClusterCut::Count { k } => cut_by_count(database.dendrogram(), k),
    };

    database.submissions().write_labeled_csv(&labels, &args.output)?;
    println!("Wrote {} labeled submissions -> {}", labels.len(), args.output.display());
    Ok(())
}
