use crate::handlers::client_addr;
use crate::handlers::error::{handle_server_error, handle_storage_error};
use crate::state::AppState;
use actix_web::body::SizedStream;
use actix_web::{get, web, HttpRequest, HttpResponse, Result as ActixResult};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

/// Serve a stored file's bytes
#[get("/uploads/{name}")]
pub async fn download(
    req: HttpRequest,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let name = name.into_inner();

    let path = state
        .storage
        .path_of(&name)
        .await
        .map_err(handle_storage_error)?;
    // Deleted between lookup and open: report as missing
    let file = File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            actix_web::error::ErrorNotFound(format!("file {:?} not found", name))
        } else {
            handle_server_error("Failed to open file", e)
        }
    })?;
    let len = file
        .metadata()
        .await
        .map_err(|e| handle_server_error("Failed to read file metadata", e))?
        .len();

    if let Err(e) = state.counters.record_download().await {
        warn!(error = %e, "Download served but not counted");
    }

    info!(
        filename = ?name,
        size_bytes = len,
        client = %client_addr(&req),
        "GET /uploads - File downloaded"
    );

    let content_type = mime_guess::from_path(&name).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(content_type.essence_str())
        .no_chunking(len)
        .body(SizedStream::new(len, ReaderStream::new(file))))
}
