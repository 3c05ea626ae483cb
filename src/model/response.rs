use crate::model::form::FieldErrors;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: String,
    pub message: String,
}

/// Body rendered by the per-route failure boundary.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub status: String,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationResult {
    Created,
    Deleted,
}

/// Outcome of one admin form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MutationResponse {
    /// Reply of single-purpose routes submitted without an intent.
    Inserted { id: i32 },
    Applied { result: MutationResult },
    Rejected {
        errors: FieldErrors,
        values: BTreeMap<String, String>,
    },
}

impl MutationResponse {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MutationResponse::Rejected { .. })
    }
}
