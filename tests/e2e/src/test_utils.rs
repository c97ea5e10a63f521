use anyhow::{Context, Result};
use common::{AdminSnapshotResponse, DeleteResponse, FileListResponse, UploadResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;

/// Admin login used for the authenticated routes
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

pub fn test_content(name: &str) -> Vec<u8> {
    format!("Test file {} content\n", name).into_bytes()
}

pub async fn wait_for_server(client: &Client, url: &str) -> Result<()> {
    let health_url = format!("{}/health", url);

    println!("Waiting for server to be ready...");
    for i in 0..30 {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                println!("Server is ready!");
                return Ok(());
            }
            _ => {
                if i < 29 {
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    anyhow::bail!("Server did not become ready within 30 seconds");
}

/// POST /upload; returns the status and, on success, the parsed body
pub async fn upload_file(
    client: &Client,
    server_url: &str,
    filename: &str,
    content: Vec<u8>,
) -> Result<(StatusCode, Option<UploadResponse>)> {
    // Send the name verbatim so the server sees exactly what was typed
    let form = Form::new()
        .percent_encode_noop()
        .part("file", Part::bytes(content).file_name(filename.to_string()));
    let response = client
        .post(format!("{}/upload", server_url))
        .multipart(form)
        .send()
        .await
        .context("Failed to send upload request")?;

    let status = response.status();
    if status != StatusCode::CREATED {
        return Ok((status, None));
    }
    let body = response
        .json()
        .await
        .context("Failed to parse upload response")?;
    Ok((status, Some(body)))
}

pub async fn list_files(client: &Client, server_url: &str) -> Result<FileListResponse> {
    client
        .get(format!("{}/list", server_url))
        .send()
        .await?
        .error_for_status()
        .context("List request failed")?
        .json()
        .await
        .context("Failed to parse list response")
}

pub async fn direct_link(client: &Client, server_url: &str, filename: &str) -> Result<String> {
    client
        .get(format!("{}/file/{}/direct-link", server_url, filename))
        .send()
        .await?
        .error_for_status()
        .context("Direct link request failed")?
        .text()
        .await
        .context("Failed to read direct link")
}

/// GET an absolute URL; `None` when the server answers 404
pub async fn download(client: &Client, url: &str) -> Result<Option<Vec<u8>>> {
    let response = client.get(url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let bytes = response
        .error_for_status()
        .context("Download request failed")?
        .bytes()
        .await?;
    Ok(Some(bytes.to_vec()))
}

pub async fn admin_snapshot(
    client: &Client,
    server_url: &str,
    login: Option<&AdminLogin>,
) -> Result<(StatusCode, Option<AdminSnapshotResponse>)> {
    let mut request = client.get(format!("{}/admin", server_url));
    if let Some(login) = login {
        request = request.basic_auth(&login.username, Some(&login.password));
    }
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Ok((status, None));
    }
    let body = response
        .json()
        .await
        .context("Failed to parse admin snapshot")?;
    Ok((status, Some(body)))
}

pub async fn admin_delete(
    client: &Client,
    server_url: &str,
    login: &AdminLogin,
    filename: &str,
) -> Result<DeleteResponse> {
    client
        .delete(format!("{}/admin/file/{}", server_url, filename))
        .basic_auth(&login.username, Some(&login.password))
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("Failed to delete {}", filename))?
        .json()
        .await
        .context("Failed to parse delete response")
}
