mod builtins;
mod capability;
mod chain;
mod state;

pub use builtins::{Accept1d, AcceptNd, ClusterSizeSoftConstraint, IntraclusterScore, SingleFlipProposal};
pub use capability::{Accept, Constraint, Proposal, Score};
pub use chain::{geo_chain, geo_semantic_chain, semantic_chain, MarkovChain};
pub use state::ChainState;
