use crate::model::form::{FieldErrors, FormDecoder, FormSchema, FormValues};
use crate::model::response::{FailureResponse, MutationResponse, MutationResult};
use crate::model::Entity;
use crate::repository::{Repository, StorageError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{debug, error, info, warn};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ACTION_FIELD: &str = "_action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Delete,
}

impl FromStr for Intent {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "create" => Ok(Intent::Create),
            "delete" => Ok(Intent::Delete),
            other => Err(PipelineError::UnknownIntent(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unrecognised request intent {0:?}")]
    UnknownIntent(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One admin form post, with its intent already decoded.
#[derive(Debug)]
pub struct Submission {
    pub intent: Intent,
    /// Posted without an intent to a single-purpose route.
    pub legacy: bool,
    pub values: FormValues,
}

impl Submission {
    pub fn decode<E: Entity>(pairs: Vec<(String, String)>) -> Result<Submission, PipelineError> {
        let mut values = FormValues::from(pairs);
        let (intent, legacy) = match values.take(ACTION_FIELD) {
            Some(action) => (action.parse::<Intent>()?, false),
            None if E::SINGLE_PURPOSE => (Intent::Create, true),
            None => return Err(PipelineError::UnknownIntent(String::new())),
        };
        Ok(Submission {
            intent,
            legacy,
            values,
        })
    }
}

fn rejected<E: Entity>(errors: FieldErrors, values: &FormValues) -> MutationResponse {
    MutationResponse::Rejected {
        errors,
        values: values.echo(<E::Create as FormSchema>::LIST_FIELDS),
    }
}

/// Turns one submission into at most one repository write.
pub async fn apply<E, R>(
    repo: &R,
    submission: Submission,
) -> Result<MutationResponse, PipelineError>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    let Submission {
        intent,
        legacy,
        values,
    } = submission;

    match intent {
        Intent::Create => match <E::Create as FormSchema>::decode(&values) {
            Ok(record) => {
                let created = repo.create(record).await?;
                info!("created {} {}", E::LABEL, created.id());
                if legacy {
                    Ok(MutationResponse::Inserted { id: created.id() })
                } else {
                    Ok(MutationResponse::Applied {
                        result: MutationResult::Created,
                    })
                }
            }
            Err(errors) => {
                debug!("rejected {} create, {} field(s): {:?}", E::LABEL, errors.len(), errors);
                Ok(rejected::<E>(errors, &values))
            }
        },
        Intent::Delete => {
            let mut decoder = FormDecoder::new(&values);
            let id = decoder.id(E::ID_FIELD);
            match decoder.into_result(id) {
                Ok(id) => {
                    repo.delete(id).await?;
                    info!("deleted {} {}", E::LABEL, id);
                    Ok(MutationResponse::Applied {
                        result: MutationResult::Deleted,
                    })
                }
                Err(errors) => {
                    debug!("rejected {} delete: {:?}", E::LABEL, errors);
                    Ok(rejected::<E>(errors, &values))
                }
            }
        }
    }
}

/// The per-route failure boundary: everything but a validation rejection.
#[derive(Debug)]
pub struct RouteFailure {
    pub title: String,
    pub error: PipelineError,
}

impl RouteFailure {
    pub fn new<E: Entity>(error: PipelineError) -> Self {
        match &error {
            PipelineError::UnknownIntent(raw) => {
                warn!("unknown intent {:?} on the {} form", raw, E::LABEL)
            }
            PipelineError::Storage(err) => error!("{} form failed: {}", E::LABEL, err),
        }
        RouteFailure {
            title: format!("Error occurred in {} form", E::LABEL),
            error,
        }
    }
}

impl fmt::Display for RouteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.error)
    }
}

impl ResponseError for RouteFailure {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            PipelineError::UnknownIntent(_) => StatusCode::BAD_REQUEST,
            PipelineError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PipelineError::Storage(StorageError::Constraint(_)) => StatusCode::CONFLICT,
            PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(FailureResponse {
            status: "failed".to_string(),
            title: self.title.clone(),
            detail: self.error.to_string(),
        })
    }
}
