use std::path::PathBuf;
use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{post, put};
use axum_extra::TypedHeader;
use bevy::asset::Assets;
use bevy::prelude::{EventWriter, Image, PerspectiveProjection, Query, ResMut, Resource, StandardMaterial, Transform};
use bytes::Bytes;
use headers::ContentLength;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use funny_face_api::{ApiError, PropStatus, ScreenshotResponse, SelectPropRequest, SetCameraRequest, SetFacesRequest};

use crate::props::PropControl;
use crate::screenshot::{next_screenshot_path, TakeScreenshot};
use crate::tracking::LatestFace;
use crate::webcam::{backdrop_scale, camera_image, WebcamTexture};

pub enum Command {
    SetFaces(SetFacesRequest),
    SetCamera(SetCameraRequest),
    Prop(PropControl),
    Screenshot(PathBuf),
}

/// Selected prop as last published by the app, readable from API handlers.
#[derive(Debug, Clone, Default, Resource)]
pub struct SharedPropStatus(Arc<RwLock<PropStatus>>);

impl SharedPropStatus {
    pub fn get(&self) -> PropStatus {
        self.0.read().clone()
    }

    pub fn set(&self, status: PropStatus) {
        *self.0.write() = status;
    }
}

pub struct ApiState {
    tx: mpsc::UnboundedSender<Command>,
    status: SharedPropStatus,
    screenshot_dir: PathBuf,
}

impl ApiState {
    pub fn new(status: SharedPropStatus, screenshot_dir: PathBuf) -> (Arc<Self>, ApiResource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self {
            tx,
            status,
            screenshot_dir,
        }), ApiResource {
            rx
        })
    }

    fn send(&self, command: Command) -> Result<(), ApiError> {
        self.tx.send(command).map_err(|_| ApiError::unavailable())
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)
        .and_then(|w| w.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
}

async fn put_camera(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    TypedHeader(ContentLength(content_length)): TypedHeader<ContentLength>,
    payload: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(width) = header_u32(&headers, "width") else {
        return Err(ApiError::invalid_argument("missing width"));
    };

    let Some(height) = header_u32(&headers, "height") else {
        return Err(ApiError::invalid_argument("missing height"));
    };

    if width == 0 || height == 0 {
        return Err(ApiError::invalid_argument("empty frame"));
    }

    let payload_size = width as u64 * height as u64 * 4;
    if content_length != payload_size || payload.len() as u64 != payload_size {
        return Err(ApiError::invalid_argument("invalid payload size"));
    }

    state.send(Command::SetCamera(SetCameraRequest {
        width,
        height,
        payload,
    }))?;
    Ok(StatusCode::OK)
}

async fn put_faces(
    State(state): State<Arc<ApiState>>,
    Json(faces): Json<SetFacesRequest>,
) -> Result<StatusCode, ApiError> {
    state.send(Command::SetFaces(faces))?;
    Ok(StatusCode::OK)
}

async fn get_prop(State(state): State<Arc<ApiState>>) -> Json<PropStatus> {
    Json(state.status.get())
}

async fn put_prop(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SelectPropRequest>,
) -> Result<StatusCode, ApiError> {
    let count = state.status.get().count;
    if request.index >= count {
        return Err(ApiError::invalid_argument(
            format!("prop index {} out of range (0..{})", request.index, count)));
    }

    state.send(Command::Prop(PropControl::Select(request.index)))?;
    Ok(StatusCode::OK)
}

async fn post_next_prop(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.send(Command::Prop(PropControl::Next))?;
    Ok(StatusCode::OK)
}

async fn post_previous_prop(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.send(Command::Prop(PropControl::Previous))?;
    Ok(StatusCode::OK)
}

async fn post_screenshot(
    State(state): State<Arc<ApiState>>,
) -> Result<(StatusCode, Json<ScreenshotResponse>), ApiError> {
    let path = next_screenshot_path(&state.screenshot_dir);
    let response = ScreenshotResponse {
        path: path.display().to_string(),
    };
    state.send(Command::Screenshot(path))?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

pub fn new_api() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/v1/camera", put(put_camera))
        .route("/v1/faces", put(put_faces))
        .route("/v1/prop", put(put_prop).get(get_prop))
        .route("/v1/prop/next", post(post_next_prop))
        .route("/v1/prop/previous", post(post_previous_prop))
        .route("/v1/screenshot", post(post_screenshot))
        .layer(DefaultBodyLimit::disable())
}

#[derive(Resource)]
pub struct ApiResource {
    rx: mpsc::UnboundedReceiver<Command>,
}

pub fn update_api(
    mut api: ResMut<ApiResource>,
    mut face: ResMut<LatestFace>,
    mut props: EventWriter<PropControl>,
    mut screenshots: EventWriter<TakeScreenshot>,
    mut cameras: Query<(&WebcamTexture, &mut Transform)>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    while let Ok(command) = api.rx.try_recv() {
        match command {
            Command::SetFaces(request) => {
                face.set(request.faces.into_iter().next());
            }
            Command::SetCamera(request) => {
                let image = camera_image(&request);
                let scale = backdrop_scale(request.width, request.height, PerspectiveProjection::default().fov);
                for (component, mut transform) in &mut cameras {
                    images.insert(&component.image, image.clone());
                    // Touch the material so it rebinds the new texture.
                    materials.get_mut(&component.material);
                    transform.scale = scale;
                }
            }
            Command::Prop(control) => {
                props.send(control);
            }
            Command::Screenshot(path) => {
                screenshots.send(TakeScreenshot { path: Some(path) });
            }
        }
    }
}
