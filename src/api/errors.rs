// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::agent::AgentError;
use crate::agent::PlannerError;
use crate::index::IndexError;
use crate::session::SessionError;

/// JSON body returned for every API error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    NotFound(String),
    /// Query before any collection exists
    NoActiveCollection,
    /// Collection/embedder pairing rejected
    ModelMismatch(String),
    /// Missing credential for the reasoning service
    Configuration(String),
    /// Reasoning-service failure or step-ceiling exhaustion
    ReasoningUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoActiveCollection => StatusCode::CONFLICT,
            ApiError::ModelMismatch(_) => StatusCode::CONFLICT,
            ApiError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ReasoningUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::NotFound(msg) => ("not_found", msg.clone()),
            ApiError::NoActiveCollection => (
                "no_active_collection",
                "No collection has been built yet - upload documents first".to_string(),
            ),
            ApiError::ModelMismatch(msg) => ("model_mismatch", msg.clone()),
            ApiError::Configuration(msg) => ("configuration_error", msg.clone()),
            ApiError::ReasoningUnavailable(msg) => ("reasoning_service_error", msg.clone()),
            ApiError::Internal(msg) => ("internal_error", msg.clone()),
        };
        ErrorResponse {
            error_type: error_type.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NoActiveCollection => ApiError::NoActiveCollection,
            SessionError::UnknownCollection(id) => {
                ApiError::NotFound(format!("Unknown collection: {}", id))
            }
            SessionError::Index(e) => match &e {
                IndexError::EmptyCorpus => ApiError::InvalidRequest(e.user_message()),
                IndexError::CollectionNotFound(_) => ApiError::NotFound(e.user_message()),
                IndexError::ModelMismatch { .. } | IndexError::DimensionMismatch { .. } => {
                    ApiError::ModelMismatch(e.user_message())
                }
                _ => ApiError::Internal(e.user_message()),
            },
            SessionError::Agent(e) => match &e {
                AgentError::Planner(PlannerError::MissingApiKey) => {
                    ApiError::Configuration(e.user_message())
                }
                AgentError::Planner(_) | AgentError::StepLimitExceeded { .. } => {
                    ApiError::ReasoningUnavailable(e.user_message())
                }
                AgentError::Tool { .. } => ApiError::Internal(e.user_message()),
            },
            SessionError::Note(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_active_collection_maps_to_conflict() {
        let api: ApiError = SessionError::NoActiveCollection.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.body().error_type, "no_active_collection");
    }

    #[test]
    fn test_empty_corpus_maps_to_bad_request() {
        let api: ApiError = SessionError::Index(IndexError::EmptyCorpus).into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.body().error_type, "invalid_request");
    }

    #[test]
    fn test_missing_api_key_maps_to_service_unavailable() {
        let api: ApiError =
            SessionError::Agent(AgentError::Planner(PlannerError::MissingApiKey)).into();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_step_ceiling_maps_to_bad_gateway() {
        let api: ApiError =
            SessionError::Agent(AgentError::StepLimitExceeded { max_steps: 8 }).into();
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert!(api.body().message.contains("could not complete"));
    }

    #[test]
    fn test_model_mismatch_maps_to_conflict() {
        let api: ApiError = SessionError::Index(IndexError::ModelMismatch {
            collection_model: "a".to_string(),
            query_model: "b".to_string(),
        })
        .into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
        assert_eq!(api.body().error_type, "model_mismatch");
    }
}
