//! The central policy engine combining grammar constraints with the
//! document's cross-reference graph.

use std::collections::BTreeMap;

use tei_model::{DocumentSnapshot, EntityKind, QueuedTag, TextRange};
use tei_schema::{
    AttributeType, ConstraintCache, ParsedConstraints, SchemaError, TagConstraint,
};

use crate::issue::{Fix, IssueCode, ValidationIssue, ValidationReport, ValidationWarning};
use crate::resolver;

/// A proposed tag insertion, not yet part of any document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCandidate {
    pub tag_type: String,
    pub attributes: BTreeMap<String, String>,
    pub passage_id: String,
    pub range: TextRange,
}

impl TagCandidate {
    pub fn from_queued(entry: &QueuedTag) -> Self {
        Self {
            tag_type: entry.tag_type.clone(),
            attributes: entry.attributes.clone(),
            passage_id: entry.passage_id.clone(),
            range: entry.range,
        }
    }
}

/// Validates candidate edits against a cached grammar and a document
/// snapshot. Owns its constraint cache; construct one and inject it rather
/// than sharing hidden global state.
pub struct Validator {
    cache: ConstraintCache,
}

impl Validator {
    pub fn new(cache: ConstraintCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ConstraintCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Validate one candidate against the grammar addressed by `schema_key`.
    ///
    /// The cache read on a cold miss is the only fallible part; the
    /// validation itself is pure and returns its verdict as data.
    pub fn validate(
        &mut self,
        candidate: &TagCandidate,
        snapshot: &DocumentSnapshot,
        schema_key: &str,
    ) -> Result<ValidationReport, SchemaError> {
        let constraints = self.cache.get(schema_key)?;
        let report = validate_candidate(&constraints, candidate, snapshot);
        tracing::debug!(
            tag_type = %candidate.tag_type,
            valid = report.valid,
            errors = report.errors.len(),
            "validated candidate tag"
        );
        Ok(report)
    }
}

/// Pure validation against an already-parsed rule set.
pub fn validate_candidate(
    constraints: &ParsedConstraints,
    candidate: &TagCandidate,
    snapshot: &DocumentSnapshot,
) -> ValidationReport {
    let Some(constraint) = constraints.tag(&candidate.tag_type) else {
        let issue = ValidationIssue::error(
            IssueCode::UnknownElement,
            format!(
                "element <{}> is not declared by the grammar",
                candidate.tag_type
            ),
        );
        return ValidationReport::new(vec![issue], Vec::new(), Vec::new());
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut add_fixes = Vec::new();
    let mut change_fixes = Vec::new();
    let mut create_fixes = Vec::new();

    check_target(candidate, snapshot, &mut errors);
    check_missing_required(candidate, constraint, snapshot, &mut errors, &mut add_fixes);
    check_supplied(
        candidate,
        constraint,
        snapshot,
        &mut errors,
        &mut warnings,
        &mut change_fixes,
        &mut create_fixes,
    );

    // Fix ordering: add-missing-required, then change-invalid-reference,
    // then create-entity.
    let mut fixes = add_fixes;
    fixes.append(&mut change_fixes);
    fixes.append(&mut create_fixes);
    ValidationReport::new(errors, warnings, fixes)
}

fn check_target(
    candidate: &TagCandidate,
    snapshot: &DocumentSnapshot,
    errors: &mut Vec<ValidationIssue>,
) {
    match snapshot.passage(&candidate.passage_id) {
        None => {
            errors.push(ValidationIssue::error(
                IssueCode::UnknownPassage,
                format!("passage {} does not exist", candidate.passage_id),
            ));
        }
        Some(passage) => {
            if !candidate.range.fits(passage.content.len()) {
                errors.push(ValidationIssue::error(
                    IssueCode::RangeOutOfBounds,
                    format!(
                        "range {}..{} does not fit passage {} ({} bytes)",
                        candidate.range.start,
                        candidate.range.end,
                        candidate.passage_id,
                        passage.content.len()
                    ),
                ));
            }
        }
    }
}

fn check_missing_required(
    candidate: &TagCandidate,
    constraint: &TagConstraint,
    snapshot: &DocumentSnapshot,
    errors: &mut Vec<ValidationIssue>,
    add_fixes: &mut Vec<Fix>,
) {
    for attribute in &constraint.required {
        if candidate.attributes.contains_key(&attribute.name) {
            continue;
        }
        errors.push(ValidationIssue::error(
            IssueCode::MissingRequiredAttribute,
            format!(
                "<{}> requires attribute \"{}\"",
                candidate.tag_type, attribute.name
            ),
        ));
        let suggested_values = if attribute.value_type == AttributeType::IdRef {
            let kind = resolver::expected_kind(&candidate.tag_type, &attribute.name);
            resolver::suggestion_pool(snapshot, kind)
                .iter()
                .map(|entity| entity.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        add_fixes.push(Fix::AddAttribute {
            attribute: attribute.name.clone(),
            suggested_values,
        });
    }
}

fn check_supplied(
    candidate: &TagCandidate,
    constraint: &TagConstraint,
    snapshot: &DocumentSnapshot,
    errors: &mut Vec<ValidationIssue>,
    warnings: &mut Vec<ValidationWarning>,
    change_fixes: &mut Vec<Fix>,
    create_fixes: &mut Vec<Fix>,
) {
    for (name, value) in &candidate.attributes {
        let Some(declared) = constraint.attribute(name) else {
            warnings.push(ValidationWarning {
                message: format!(
                    "attribute \"{name}\" is not declared on <{}>",
                    candidate.tag_type
                ),
            });
            continue;
        };
        match &declared.value_type {
            AttributeType::IdRef => {
                if resolver::resolve(value, snapshot).is_some() {
                    continue;
                }
                errors.push(ValidationIssue::error(
                    IssueCode::InvalidReferenceTarget,
                    format!("\"{value}\" does not reference any entity in the document"),
                ));
                let kind = resolver::expected_kind(&candidate.tag_type, name);
                let pool = resolver::suggestion_pool(snapshot, kind);
                if pool.is_empty() {
                    create_fixes.push(Fix::CreateEntity {
                        kind: kind.unwrap_or(EntityKind::Character),
                        suggested_name: resolver::strip_reference_prefix(value).to_string(),
                    });
                } else {
                    change_fixes.push(Fix::ChangeAttribute {
                        attribute: name.clone(),
                        suggested_values: pool
                            .iter()
                            .map(|entity| format!("#{}", entity.id))
                            .collect(),
                    });
                }
            }
            AttributeType::Boolean => {
                if !matches!(value.as_str(), "true" | "false" | "1" | "0") {
                    errors.push(ValidationIssue::error(
                        IssueCode::InvalidAttributeValue,
                        format!("attribute \"{name}\" expects a boolean, got \"{value}\""),
                    ));
                }
            }
            AttributeType::Enumeration(allowed) => {
                if !allowed.iter().any(|candidate_value| candidate_value == value) {
                    errors.push(ValidationIssue::error(
                        IssueCode::InvalidAttributeValue,
                        format!(
                            "attribute \"{name}\" must be one of [{}], got \"{value}\"",
                            allowed.join(", ")
                        ),
                    ));
                }
            }
            AttributeType::Str => {}
        }
    }
}
