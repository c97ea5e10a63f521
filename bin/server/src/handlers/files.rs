use crate::handlers::error::handle_storage_error;
use crate::handlers::pages::{html, render_file, render_list, wants_html};
use crate::state::AppState;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpRequest, HttpResponse, Result as ActixResult};
use common::FileListResponse;
use serde::Deserialize;
use storage::ListOptions;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_directories: bool,
}

/// All stored files, sorted by name
#[get("/list")]
pub async fn list(
    req: HttpRequest,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let options = ListOptions {
        include_directories: query.include_directories,
    };
    let files = state
        .storage
        .list_with(options)
        .await
        .map_err(handle_storage_error)?;

    info!(count = files.len(), "GET /list - Listed files");

    let listing = FileListResponse {
        files: files.iter().map(|file| state.file_info(file)).collect(),
    };
    if wants_html(&req) {
        return Ok(html(StatusCode::OK, render_list(&listing)));
    }
    Ok(HttpResponse::Ok().json(listing))
}

#[get("/file/{name}")]
pub async fn file_detail(
    req: HttpRequest,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let file = state
        .storage
        .get(&name)
        .await
        .map_err(handle_storage_error)?;
    let info = state.file_detail(&req, &file);
    if wants_html(&req) {
        return Ok(html(StatusCode::OK, render_file(&info)));
    }
    Ok(HttpResponse::Ok().json(info))
}

/// The absolute download URL as plain text, for copy and paste
#[get("/file/{name}/direct-link")]
pub async fn direct_link(
    req: HttpRequest,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let file = state
        .storage
        .get(&name)
        .await
        .map_err(handle_storage_error)?;
    let link = state.links.direct_link(&state.link_host(&req), &file);
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(link))
}
