use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::StatusCode;
use axum::Json;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use glam::Mat4;
use serde::{Deserialize, Serialize};

pub mod blend_shapes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    Unknown,
    Cancelled,
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    PermissionDenied,
    Unimplemented,
}

impl ErrorCategory {
    pub fn to_status_code(self) -> StatusCode {
        match self {
            ErrorCategory::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::FailedPrecondition => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCategory::Unimplemented => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub error_code: Cow<'static, str>,
    pub instance_id: String,
    pub message: Cow<'static, str>,
}

impl ApiError {
    pub fn with_message(
        category: ErrorCategory,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            category,
            error_code: code.into(),
            instance_id: nanoid::nanoid!(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::InvalidArgument, "invalid_argument", message)
    }

    pub fn unavailable() -> Self {
        Self::with_message(ErrorCategory::Cancelled, "unavailable", "service unavailable")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.category.to_status_code();
        (status_code, Json(self)).into_response()
    }
}

/// One frame of face tracking output.
///
/// `transform` places the face anchor in camera space; trackers that only
/// report coefficients leave it unset. Blend shape keys use the ARKit naming
/// (see [`blend_shapes`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSample {
    #[serde(default)]
    pub blend_shapes: HashMap<String, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Mat4>,
}

impl FaceSample {
    /// Coefficient for `name`, clamped to [0, 1].
    pub fn coefficient(&self, name: &str) -> Option<f32> {
        self.blend_shapes.get(name).map(|v| v.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFacesRequest {
    pub faces: Vec<FaceSample>,
}

#[derive(Debug, Clone)]
pub struct SetCameraRequest {
    pub width: u32,
    pub height: u32,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPropRequest {
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropStatus {
    pub index: usize,
    pub count: usize,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotResponse {
    pub path: String,
}
