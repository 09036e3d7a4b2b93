//! HTTP mapping of the enrollment error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use intake_core::error::EnrollmentError;

/// Error type returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    Enrollment(EnrollmentError),
    Unauthorized,
    Forbidden,
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        ApiError::Enrollment(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Enrollment(err) => {
                let message = err.to_string();
                match err {
                    EnrollmentError::Validation { issues } => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        ErrorBody {
                            error: "validation",
                            message,
                            issues: Some(issues),
                            redirect_to: None,
                        },
                    ),
                    EnrollmentError::AttemptLimitExceeded { .. } => (
                        StatusCode::FORBIDDEN,
                        ErrorBody {
                            error: "attempt-limit-exceeded",
                            message,
                            issues: None,
                            redirect_to: None,
                        },
                    ),
                    EnrollmentError::CollaboratorUnavailable { detail } => {
                        tracing::error!("collaborator unavailable: {detail}");
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            ErrorBody {
                                error: "service-unavailable",
                                message,
                                issues: None,
                                redirect_to: None,
                            },
                        )
                    }
                    EnrollmentError::StaleState { redirect_to } => (
                        StatusCode::CONFLICT,
                        ErrorBody {
                            error: "stale-state",
                            message,
                            issues: None,
                            redirect_to: Some(redirect_to.to_string()),
                        },
                    ),
                    EnrollmentError::UnknownSession => (
                        StatusCode::NOT_FOUND,
                        ErrorBody {
                            error: "unknown-session",
                            message,
                            issues: None,
                            redirect_to: None,
                        },
                    ),
                }
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized",
                    message: "a valid admin token is required".into(),
                    issues: None,
                    redirect_to: None,
                },
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "forbidden",
                    message: "the token does not carry the required permission".into(),
                    issues: None,
                    redirect_to: None,
                },
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not-found",
                    message: format!("{what} not found"),
                    issues: None,
                    redirect_to: None,
                },
            ),
            ApiError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal",
                        message: "internal server error".into(),
                        issues: None,
                        redirect_to: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::wizard::WizardStage;

    #[test]
    fn stale_state_maps_to_conflict_with_redirect() {
        let response = ApiError::Enrollment(EnrollmentError::StaleState {
            redirect_to: WizardStage::DeclarationComplete,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn attempt_limit_maps_to_forbidden() {
        let response =
            ApiError::Enrollment(EnrollmentError::AttemptLimitExceeded { attempt_count: 3 })
                .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn collaborator_maps_to_service_unavailable() {
        let response = ApiError::Enrollment(EnrollmentError::collaborator("boom")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
