#![doc = "Community of Interest map analysis: dissimilarity, clustering, and Markov-chain refinement."]

pub mod atomic;
pub mod cli;
pub mod cluster;
pub mod commands;
pub mod dissimilarity;
pub mod error;
pub mod graph;
pub mod markov;
pub mod persistence;
pub mod submissions;

#[doc(inline)]
pub use cluster::{cut_by_count, cut_by_height, Dendrogram, Step};

#[doc(inline)]
pub use dissimilarity::{avg_hausdorff, matching_distance, Dissimilarity};

#[doc(inline)]
pub use error::AnalysisError;

#[doc(inline)]
pub use graph::{DistanceOracle, Graph, UnitId};

#[doc(inline)]
pub use markov::{geo_chain, geo_semantic_chain, semantic_chain, MarkovChain};

#[doc(inline)]
pub use persistence::Database;

#[doc(inline)]
pub use submissions::{SubmissionMetadata, SubmissionTable};
