//! Batch application of a tag queue against a document store.
//!
//! Entries are processed in a single pass, each re-validated against the
//! snapshot produced by the previous entry's application, since an earlier
//! edit in the batch can change what a later one sees.

use tei_model::{DocumentEvent, DocumentStore, TagQueue};
use tei_schema::SchemaError;

use crate::issue::{IssueCode, ValidationIssue, ValidationReport};
use crate::validator::{TagCandidate, Validator};

/// Result of committing one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Queue ids applied to the document, in pass order.
    pub applied: Vec<u64>,
    /// Queue ids that failed, with the report explaining why.
    pub failed: Vec<(u64, ValidationReport)>,
    /// Document revision after the pass.
    pub revision: u64,
}

impl BatchOutcome {
    pub fn all_applied(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validate and apply every pending entry of the queue.
///
/// Valid entries become `TagAdded` events and are marked applied; invalid
/// ones are marked failed and stay retryable. Only a schema read/parse
/// failure aborts the pass; by then nothing of the current entry has been
/// committed.
pub fn apply_batch(
    queue: &mut TagQueue,
    store: &mut DocumentStore,
    validator: &mut Validator,
    schema_key: &str,
) -> Result<BatchOutcome, SchemaError> {
    let pending: Vec<u64> = queue.pending().map(|entry| entry.id).collect();
    let mut outcome = BatchOutcome {
        applied: Vec::new(),
        failed: Vec::new(),
        revision: store.snapshot().revision,
    };

    for id in pending {
        let Some(entry) = queue.entries().iter().find(|entry| entry.id == id).cloned() else {
            continue;
        };
        let candidate = TagCandidate::from_queued(&entry);
        let report = validator.validate(&candidate, store.snapshot(), schema_key)?;
        if !report.valid {
            // Queue transitions cannot fail here: the id came from the
            // pending bucket and nothing else mutates the queue mid-pass.
            let _ = queue.mark_failed(id);
            outcome.failed.push((id, report));
            continue;
        }

        let tag = entry.to_tag(format!("tag-{id}"));
        match store.apply(DocumentEvent::TagAdded {
            passage_id: entry.passage_id.clone(),
            tag,
        }) {
            Ok(revision) => {
                let _ = queue.mark_applied(id);
                outcome.applied.push(id);
                outcome.revision = revision;
            }
            Err(error) => {
                tracing::warn!(id, %error, "store rejected validated tag");
                let _ = queue.mark_failed(id);
                let issue = ValidationIssue::error(IssueCode::ApplyRejected, error.to_string());
                outcome
                    .failed
                    .push((id, ValidationReport::new(vec![issue], Vec::new(), Vec::new())));
            }
        }
    }

    tracing::info!(
        applied = outcome.applied.len(),
        failed = outcome.failed.len(),
        revision = outcome.revision,
        "batch pass finished"
    );
    Ok(outcome)
}
