use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span};

use tei_cli::document::{DocumentFile, TagRequest, load_document, load_tag_requests, save_document};
use tei_model::TagQueue;
use tei_schema::{
    CacheConfig, ConstraintCache, FsSchemaSource, ParsedConstraints, parse_grammar,
};
use tei_validate::{
    BatchOutcome, ReportEntry, TagCandidate, ValidationReport, Validator, apply_batch,
    write_validation_report_json,
};

use crate::cli::{ApplyArgs, SchemaArgs, ValidateArgs};

/// Outcome of `tei-annotate schema`.
pub struct SchemaResult {
    pub schema: PathBuf,
    pub constraints: ParsedConstraints,
}

/// One candidate with its validation report, for display and reporting.
pub struct CandidateResult {
    pub subject: String,
    pub report: ValidationReport,
}

/// Outcome of `tei-annotate validate`.
pub struct ValidateResult {
    pub document: PathBuf,
    pub candidates: Vec<CandidateResult>,
    pub report_path: Option<PathBuf>,
    pub has_errors: bool,
}

/// Outcome of `tei-annotate apply`.
pub struct ApplyResult {
    pub document: PathBuf,
    pub output: PathBuf,
    pub outcome: BatchOutcome,
    pub failed: Vec<CandidateResult>,
    pub report_path: Option<PathBuf>,
    pub has_errors: bool,
}

pub fn run_schema(args: &SchemaArgs) -> Result<SchemaResult> {
    let text = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("read schema {}", args.schema.display()))?;
    let constraints = parse_grammar(&text)
        .with_context(|| format!("parse schema {}", args.schema.display()))?;
    info!(
        schema = %args.schema.display(),
        tags = constraints.len(),
        "schema parsed"
    );
    Ok(SchemaResult {
        schema: args.schema.clone(),
        constraints,
    })
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let span = info_span!("validate", document = %args.document.display());
    let _guard = span.enter();

    let (mut validator, schema_key) = validator_for(&args.schema)?;
    let store = load_document(&args.document)?
        .into_store()
        .with_context(|| format!("rebuild document {}", args.document.display()))?;
    let requests = load_tag_requests(&args.tags)?;
    info!(candidates = requests.len(), "validating candidates");

    let mut candidates = Vec::new();
    for (index, request) in requests.into_iter().enumerate() {
        let subject = subject_for(index as u64, &request.tag_type, &request.passage_id);
        let candidate = TagCandidate {
            tag_type: request.tag_type,
            attributes: request.attributes,
            passage_id: request.passage_id,
            range: request.range,
        };
        let report = validator.validate(&candidate, store.snapshot(), &schema_key)?;
        debug!(subject = %subject, valid = report.valid, "candidate checked");
        candidates.push(CandidateResult { subject, report });
    }

    let has_errors = candidates.iter().any(|candidate| !candidate.report.valid);
    let report_path = match &args.report_json {
        Some(dir) => Some(write_report(dir, &args.document, &candidates)?),
        None => None,
    };
    Ok(ValidateResult {
        document: args.document.clone(),
        candidates,
        report_path,
        has_errors,
    })
}

pub fn run_apply(args: &ApplyArgs) -> Result<ApplyResult> {
    let span = info_span!("apply", document = %args.document.display());
    let _guard = span.enter();

    let (mut validator, schema_key) = validator_for(&args.schema)?;
    let mut store = load_document(&args.document)?
        .into_store()
        .with_context(|| format!("rebuild document {}", args.document.display()))?;
    let requests = load_tag_requests(&args.tags)?;

    let mut queue = TagQueue::new();
    let mut subjects = Vec::new();
    for request in requests {
        let TagRequest {
            tag_type,
            passage_id,
            range,
            attributes,
        } = request;
        let id = queue.add(&tag_type, attributes, &passage_id, range);
        subjects.push((id, subject_for(id, &tag_type, &passage_id)));
    }
    info!(candidates = queue.len(), "applying batch");

    let outcome = apply_batch(&mut queue, &mut store, &mut validator, &schema_key)?;

    let failed: Vec<CandidateResult> = outcome
        .failed
        .iter()
        .map(|(id, report)| CandidateResult {
            subject: subjects
                .iter()
                .find(|(entry_id, _)| entry_id == id)
                .map(|(_, subject)| subject.clone())
                .unwrap_or_else(|| format!("queue:{id}")),
            report: report.clone(),
        })
        .collect();

    let output = args.output.clone().unwrap_or_else(|| args.document.clone());
    save_document(&output, &DocumentFile::from_snapshot(store.snapshot()))?;
    info!(
        applied = outcome.applied.len(),
        failed = failed.len(),
        output = %output.display(),
        "document written"
    );

    let has_errors = !failed.is_empty();
    let report_path = match &args.report_json {
        Some(dir) => Some(write_report(dir, &args.document, &failed)?),
        None => None,
    };
    Ok(ApplyResult {
        document: args.document.clone(),
        output,
        outcome,
        failed,
        report_path,
        has_errors,
    })
}

/// Build a validator over the schema file's directory, keyed by file name.
fn validator_for(schema: &Path) -> Result<(Validator, String)> {
    let key = schema
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("schema path has no file name: {}", schema.display()))?
        .to_string();
    let root = schema.parent().unwrap_or_else(|| Path::new("."));
    let cache = ConstraintCache::new(
        Box::new(FsSchemaSource::new(root)),
        CacheConfig::default(),
    );
    Ok((Validator::new(cache), key))
}

fn subject_for(id: u64, tag_type: &str, passage_id: &str) -> String {
    format!("queue:{id} {tag_type}@{passage_id}")
}

fn write_report(dir: &Path, document: &Path, candidates: &[CandidateResult]) -> Result<PathBuf> {
    let entries: Vec<ReportEntry> = candidates
        .iter()
        .map(|candidate| ReportEntry::new(candidate.subject.clone(), candidate.report.clone()))
        .collect();
    let document_name = document.display().to_string();
    write_validation_report_json(dir, &document_name, &entries)
}
