use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::color::Filter;
use crate::config::Config;
use crate::error::{PixelError, RenderError};
use crate::figure::parse_figure;
use crate::graph::GraphDescription;
use crate::image::Image;
use crate::login::{self, CurrentUser};
use crate::render::GraphRenderer;
use crate::roster::export_users;
use crate::store::{ImageStore, UserCount};

/// How many users the top-users statistic reports.
const TOP_USERS: usize = 3;

pub struct AppState {
    pub config: Config,
    pub store: ImageStore,
    pub renderer: Arc<dyn GraphRenderer>,
}

impl AppState {
    pub fn new(config: Config) -> crate::error::Result<Self> {
        login::init_database(&config.database_dir)?;
        let store = ImageStore::open(&config.database_dir)?;
        let renderer = Arc::new(config.renderer());
        Ok(AppState {
            config,
            store,
            renderer,
        })
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: String,
}

/// `{"status": "success", "data": ...}` envelope for read endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(DataResponse {
            status: "success".to_string(),
            data,
        })
    }
}

#[derive(Serialize)]
struct ImageCount {
    user_id: String,
    image_count: usize,
}

#[derive(Serialize)]
struct EditedCount {
    user_id: String,
    edited_count: usize,
}

#[derive(Serialize)]
struct AddImageResponse {
    status: String,
    image_id: String,
    /// Base64 of the rendered matrix, absent when rendering failed
    graph: Option<String>,
    render_error: Option<String>,
}

#[derive(Serialize)]
struct TransformResponse {
    status: String,
    image_id: String,
    original_graph: Option<String>,
    transformed_graph: Option<String>,
    render_error: Option<String>,
}

#[derive(Serialize)]
struct ImageSummary {
    id: String,
    name: String,
    edited: bool,
    pixels: usize,
    rows: usize,
    columns: usize,
}

impl IntoResponse for PixelError {
    fn into_response(self) -> Response {
        let status = match &self {
            PixelError::Figure { .. }
            | PixelError::Roster { .. }
            | PixelError::Color { .. }
            | PixelError::UnsupportedFilter { .. }
            | PixelError::AlreadyEdited { .. } => StatusCode::BAD_REQUEST,
            PixelError::NotFound { .. } | PixelError::UserNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            PixelError::Auth { .. } => StatusCode::UNAUTHORIZED,
            PixelError::Render(_) => StatusCode::BAD_GATEWAY,
            PixelError::Io(_) | PixelError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self);
        }
        (
            status,
            Json(StatusResponse {
                status: "error".to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Builds the router; split from [`run`] so it can be driven without a socket.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/images", post(add_image).get(list_images))
        .route("/images/:image_id/graph", get(image_graph))
        .route("/images/:image_id/graph.dot", get(image_dot))
        .route(
            "/images/:image_id/transform/:filter",
            post(transform_image),
        )
        .route("/statistics/top-users", get(top_users))
        .route("/statistics/edited-images", get(edited_images))
        .route("/users", get(login::handle_list_users))
        .route("/users/bulk-upload", post(login::handle_bulk_upload))
        .route("/users/:user_id", get(login::handle_get_user))
        .route("/export/xml", get(export_xml))
        .route_layer(middleware::from_fn(login::require_auth));

    Router::new()
        .route("/auth/register", post(login::handle_signup))
        .route("/auth/login", post(login::handle_login))
        .route("/auth/logout", post(login::handle_logout))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// Looks up an image the caller owns; other users' images are reported missing.
fn owned_image(state: &AppState, user: &str, image_id: &str) -> Result<Image, PixelError> {
    let image = state.store.get(image_id)?;
    if image.user_id != user {
        return Err(PixelError::not_found(image_id));
    }
    Ok(image)
}

async fn render(state: &AppState, graph: GraphDescription) -> Result<Vec<u8>, RenderError> {
    let renderer = Arc::clone(&state.renderer);
    tokio::task::spawn_blocking(move || renderer.render(&graph))
        .await
        .map_err(|e| RenderError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

// Renders to base64, logging instead of failing the request.
async fn render_base64(
    state: &AppState,
    image: &Image,
    render_error: &mut Option<String>,
) -> Option<String> {
    match render(state, image.to_matrix().export()).await {
        Ok(bytes) => Some(BASE64_STANDARD.encode(bytes)),
        Err(e) => {
            warn!("could not render image {:?}: {}", image.id, e);
            *render_error = Some(e.to_string());
            None
        }
    }
}

async fn add_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Response, PixelError> {
    let xml = std::str::from_utf8(&body)
        .map_err(|_| PixelError::figure("Document is not valid UTF-8"))?;
    if xml.trim().is_empty() {
        return Err(PixelError::figure("No file provided"));
    }

    let image = parse_figure(xml, &user)?;
    let image_id = state.store.add_image(image.clone())?;
    info!("{} added image {} ({})", user, image_id, image.name);

    let mut render_error = None;
    let graph = render_base64(&state, &image, &mut render_error).await;

    Ok((
        StatusCode::CREATED,
        Json(AddImageResponse {
            status: "success".to_string(),
            image_id,
            graph,
            render_error,
        }),
    )
        .into_response())
}

async fn list_images(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<ImageSummary>>, PixelError> {
    let summaries = state
        .store
        .images_by_user(&user)?
        .into_iter()
        .map(|image| {
            let matrix = image.to_matrix();
            ImageSummary {
                id: image.id.clone().unwrap_or_default(),
                name: image.name.clone(),
                edited: image.edited,
                pixels: matrix.cell_count(),
                rows: matrix.row_count(),
                columns: matrix.column_count(),
            }
        })
        .collect();
    Ok(Json(summaries))
}

async fn image_dot(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(image_id): Path<String>,
) -> Result<Response, PixelError> {
    let image = owned_image(&state, &user, &image_id)?;
    let dot = image.to_matrix().export().to_dot();
    Ok(([(header::CONTENT_TYPE, "text/vnd.graphviz")], dot).into_response())
}

async fn image_graph(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(image_id): Path<String>,
) -> Result<Response, PixelError> {
    let image = owned_image(&state, &user, &image_id)?;
    let bytes = render(&state, image.to_matrix().export()).await?;
    let content_type = state.renderer.format().content_type();
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn transform_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((image_id, filter)): Path<(String, String)>,
) -> Result<Response, PixelError> {
    let filter: Filter = filter.parse()?;
    owned_image(&state, &user, &image_id)?;

    let result = state.store.transform(&image_id, filter)?;
    let new_id = result.transformed.id.clone().unwrap_or_default();

    let mut render_error = None;
    let original_graph = render_base64(&state, &result.original, &mut render_error).await;
    let transformed_graph = render_base64(&state, &result.transformed, &mut render_error).await;

    Ok(Json(TransformResponse {
        status: "success".to_string(),
        image_id: new_id,
        original_graph,
        transformed_graph,
        render_error,
    })
    .into_response())
}

async fn top_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<ImageCount>>>, PixelError> {
    let counts = state.store.top_users(TOP_USERS)?;
    Ok(DataResponse::success(
        counts
            .into_iter()
            .map(|UserCount { user_id, count }| ImageCount {
                user_id,
                image_count: count,
            })
            .collect(),
    ))
}

async fn edited_images(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<EditedCount>>>, PixelError> {
    let counts = state.store.edited_counts()?;
    Ok(DataResponse::success(
        counts
            .into_iter()
            .map(|UserCount { user_id, count }| EditedCount {
                user_id,
                edited_count: count,
            })
            .collect(),
    ))
}

// Every user with their profile and images, in the figure layout.
async fn export_xml(State(state): State<Arc<AppState>>) -> Result<Response, PixelError> {
    let mut users: Vec<_> = login::get_users(&state.config.database_dir)
        .map_err(PixelError::store)?
        .into_values()
        .map(|user| (user.username, user.profile))
        .collect();
    users.sort_by(|a, b| a.0.cmp(&b.0));

    let xml = export_users(&users, &state.store.all_images()?);
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}
