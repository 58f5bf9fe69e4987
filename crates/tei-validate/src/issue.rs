//! Validation outcome types.
//!
//! "Invalid" is an expected, common outcome the editor surface must render,
//! so everything here is plain data returned from a normal call, never an
//! error path.

use std::fmt;

use serde::{Deserialize, Serialize};

use tei_model::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Stable code identifying what kind of rule was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnknownElement,
    MissingRequiredAttribute,
    InvalidReferenceTarget,
    InvalidAttributeValue,
    RangeOutOfBounds,
    UnknownPassage,
    ApplyRejected,
}

impl IssueCode {
    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            IssueCode::UnknownElement => "unknown/disallowed element",
            IssueCode::MissingRequiredAttribute => "missing required attribute",
            IssueCode::InvalidReferenceTarget => "invalid reference target",
            IssueCode::InvalidAttributeValue => "invalid attribute value",
            IssueCode::RangeOutOfBounds => "range out of bounds",
            IssueCode::UnknownPassage => "unknown passage",
            IssueCode::ApplyRejected => "apply rejected",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }
}

/// Non-fatal observation, e.g. an attribute the grammar does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub message: String,
}

/// Machine-generated, data-only repair suggestion.
///
/// Suggested values are always drawn from entities that currently exist in
/// the document, in declaration order; nothing is fabricated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fix", rename_all = "snake_case")]
pub enum Fix {
    AddAttribute {
        attribute: String,
        suggested_values: Vec<String>,
    },
    ChangeAttribute {
        attribute: String,
        suggested_values: Vec<String>,
    },
    CreateEntity {
        kind: EntityKind,
        suggested_name: String,
    },
}

/// Outcome of validating one candidate tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
    pub fixes: Vec<Fix>,
}

impl ValidationReport {
    /// Assemble a report; `valid` is derived from the error list.
    pub fn new(
        errors: Vec<ValidationIssue>,
        warnings: Vec<ValidationWarning>,
        fixes: Vec<Fix>,
    ) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            fixes,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
