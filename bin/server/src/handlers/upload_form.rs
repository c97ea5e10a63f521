use crate::constants::UPLOAD_FIELD_NAME;
use crate::handlers::pages::layout;
use actix_web::http::header::ContentType;
use actix_web::{get, HttpResponse, Result as ActixResult};
use tracing::info;

/// Upload page: one file input posting to `/upload`
#[get("/")]
pub async fn index() -> ActixResult<HttpResponse> {
    info!("GET / - Upload form requested");
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_index()))
}

fn render_index() -> String {
    layout(
        "File upload",
        &format!(
            r#"        <form action="/upload" method="post" enctype="multipart/form-data">
            <div class="mb-3">
                <label for="{field}" class="form-label">Choose a file</label>
                <input class="form-control" type="file" name="{field}" id="{field}" required>
            </div>
            <button type="submit" class="btn btn-primary">Upload</button>
        </form>
        <br>
        <a href="/list" class="btn btn-secondary">File list</a>
        <a href="/admin" class="btn btn-primary">Admin</a>"#,
            field = UPLOAD_FIELD_NAME,
        ),
    )
}
