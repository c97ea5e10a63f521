use crate::constants::{UPLOAD_BRIDGE_CAPACITY, UPLOAD_FIELD_NAME};
use crate::handlers::client_addr;
use crate::handlers::error::{handle_error, handle_storage_error};
use crate::handlers::pages::{html, render_uploaded, wants_html};
use crate::state::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::error::ErrorBadRequest;
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{post, web, HttpRequest, HttpResponse, Result as ActixResult};
use common::UploadResponse;
use futures::StreamExt;
use std::io;
use storage::{StorageResult, StoredFile};
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tracing::{info, warn};

/// Handle file upload (multipart/form-data, field `file`)
#[post("/upload")]
pub async fn upload(
    req: HttpRequest,
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    while let Some(field) = payload.next().await {
        let field = field.map_err(|e| handle_error("Malformed multipart body", e))?;
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.is_empty() {
            return Err(ErrorBadRequest("No file selected"));
        }

        info!(
            filename = ?filename,
            client = %client_addr(&req),
            "POST /upload - Request received"
        );

        let stored = store_field(&state, &filename, field)
            .await
            .map_err(handle_storage_error)?;

        if let Err(e) = state.counters.record_upload().await {
            warn!(error = %e, "Upload stored but not counted");
        }

        info!(
            filename = ?stored.name,
            size_bytes = stored.size_bytes,
            client = %client_addr(&req),
            "POST /upload - File uploaded"
        );

        let direct_link = state.links.direct_link(&state.link_host(&req), &stored);
        let response = UploadResponse {
            file: state.file_info(&stored),
            direct_link,
        };
        if wants_html(&req) {
            return Ok(html(StatusCode::CREATED, render_uploaded(&response)));
        }
        return Ok(HttpResponse::Created().json(response));
    }

    Err(ErrorBadRequest(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD_NAME
    )))
}

/// Stream one multipart field into storage.
///
/// `Field` is tied to the request and is not `Send`, so its chunks are
/// pumped through a bounded channel into a reader the store can own. When
/// the store stops early (collision, size limit) the receiver is dropped and
/// the pump stops reading.
async fn store_field(state: &AppState, filename: &str, mut field: Field) -> StorageResult<StoredFile> {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(UPLOAD_BRIDGE_CAPACITY);

    let pump = async move {
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string()));
            let failed = chunk.is_err();
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    };

    let store = async move {
        let chunks = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });
        let mut reader = StreamReader::new(Box::pin(chunks));
        state.storage.put(filename, &mut reader).await
    };

    let ((), stored) = tokio::join!(pump, store);
    stored
}
