mod batch;
mod issue;
mod report;
mod resolver;
mod validator;

pub use batch::{BatchOutcome, apply_batch};
pub use issue::{
    Fix, IssueCode, IssueSeverity, ValidationIssue, ValidationReport, ValidationWarning,
};
pub use report::{ReportEntry, write_validation_report_json};
pub use resolver::{expected_kind, resolve, strip_reference_prefix, suggestion_pool};
pub use validator::{TagCandidate, Validator, validate_candidate};
