pub mod mutation;
pub mod report;

pub use mutation::{apply, MutationOutcome};
pub use report::{Diagnostic, RunReport};
