mod table;

pub use table::{SubmissionMetadata, SubmissionTable};
