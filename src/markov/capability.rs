use rand::RngCore;

use super::state::ChainState;

/// A named objective evaluated against a chain state, e.g. average
/// intracluster distance (§4.5).
pub trait Score: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, state: &ChainState) -> f64;
}

/// Generates a candidate next state from the current one.
pub trait Proposal: Send + Sync {
    fn propose(&self, current: &ChainState, score_fns: &[Box<dyn Score>], rng: &mut dyn RngCore) -> ChainState;
}

/// A soft rule the chain is biased toward satisfying, expressed as an extra
/// multiplicative factor on the acceptance probability.
pub trait Constraint: Send + Sync {
    fn acceptance(&self, proposed: &ChainState) -> f64;
}

/// Compares a current and proposed state and returns an acceptance
/// probability in `[0, 1]`.
pub trait Accept: Send + Sync {
    fn acceptance(&self, current: &ChainState, proposed: &ChainState) -> f64;
}
