mod cut;
mod dendrogram;

pub use cut::{cut_by_count, cut_by_height};
pub use dendrogram::{Dendrogram, Step};
