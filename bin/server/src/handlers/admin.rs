use crate::auth::{unauthorized, AdminPrincipal};
use crate::handlers::client_addr;
use crate::handlers::error::handle_storage_error;
use crate::handlers::pages::{html, render_admin, wants_html};
use crate::state::AppState;
use actix_web::error::ErrorForbidden;
use actix_web::http::{header, StatusCode};
use actix_web::{delete, get, web, HttpRequest, HttpResponse, Result as ActixResult};
use common::{AdminSnapshotResponse, DeleteResponse};
use tracing::{info, warn};

/// Dashboard data: today's counters, stored files and the recent log
#[get("/admin")]
pub async fn dashboard(
    req: HttpRequest,
    admin: AdminPrincipal,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let snapshot = state.admin_view.snapshot().await;

    info!(
        admin = ?admin.username,
        files = snapshot.files.len(),
        degraded = ?snapshot.degraded,
        "GET /admin - Snapshot served"
    );

    let response = AdminSnapshotResponse {
        day: snapshot.day,
        uploads_today: snapshot.uploads_today,
        downloads_today: snapshot.downloads_today,
        log_tail: snapshot.log_tail,
        files: snapshot
            .files
            .iter()
            .map(|file| state.file_info(file))
            .collect(),
        degraded: snapshot.degraded.iter().map(|part| part.to_string()).collect(),
    };
    if wants_html(&req) {
        return Ok(html(StatusCode::OK, render_admin(&response)));
    }
    Ok(HttpResponse::Ok().json(response))
}

/// Browsers drop cached Basic credentials after a fresh challenge
#[get("/admin/logout")]
pub async fn logout() -> HttpResponse {
    unauthorized("Logged out")
}

#[delete("/admin/file/{name}")]
pub async fn delete_file(
    req: HttpRequest,
    admin: AdminPrincipal,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    remove(&req, &admin, name.into_inner(), &state).await
}

/// GET form of [`delete_file`], linked from each row of the HTML dashboard.
///
/// A state-changing GET rides on cached Basic credentials, so another site
/// could trigger it with a plain link or image. Requests whose `Origin` or
/// `Referer` names a different host are refused with 403; requests carrying
/// neither header (typed or bookmarked URLs) are allowed.
#[get("/admin/file/{name}/delete")]
pub async fn delete_file_link(
    req: HttpRequest,
    admin: AdminPrincipal,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    if !same_origin(&req) {
        warn!(
            admin = ?admin.username,
            client = %client_addr(&req),
            "Rejected cross-site delete link"
        );
        return Err(ErrorForbidden("Cross-site delete rejected"));
    }
    remove(&req, &admin, name.into_inner(), &state).await
}

/// Every `Origin`/`Referer` header present must point at this server's host
fn same_origin(req: &HttpRequest) -> bool {
    let conn = req.connection_info();
    let host = conn.host();
    [header::ORIGIN, header::REFERER].iter().all(|name| {
        match req.headers().get(name) {
            None => true,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(authority)
                .is_some_and(|authority| authority.eq_ignore_ascii_case(host)),
        }
    })
}

/// `host[:port]` of an absolute URL; `None` for opaque origins such as `null`
fn authority(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

async fn remove(
    req: &HttpRequest,
    admin: &AdminPrincipal,
    name: String,
    state: &AppState,
) -> ActixResult<HttpResponse> {
    state
        .storage
        .delete(&name)
        .await
        .map_err(handle_storage_error)?;

    info!(
        filename = ?name,
        admin = ?admin.username,
        client = %client_addr(req),
        "Admin deleted file"
    );

    Ok(HttpResponse::Ok().json(DeleteResponse { deleted: name }))
}
