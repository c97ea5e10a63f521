//! HTTP request handlers

pub mod admin;
pub mod download;
pub mod error;
pub mod files;
pub mod health;
pub mod pages;
pub mod upload;
pub mod upload_form;

use actix_web::{web, HttpRequest};

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_form::index)
        .service(upload::upload)
        .service(files::list)
        .service(files::file_detail)
        .service(files::direct_link)
        .service(download::download)
        .service(admin::dashboard)
        .service(admin::logout)
        .service(admin::delete_file)
        .service(admin::delete_file_link)
        .service(health::health);
}

/// Client address for audit logs, honoring `Forwarded`/`X-Forwarded-For`
pub(crate) fn client_addr(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}
