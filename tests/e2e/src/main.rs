mod filesystem_validator;
mod test_utils;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use test_utils::*;

const TEST_FILES_COUNT: usize = 3;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("e2e_tests=debug,info")
        .init();

    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let server_data_dir = std::env::var("SERVER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| manifest_dir.join("test_data").join("uploads"));
    let login = AdminLogin {
        username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        password: std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?,
    };

    println!("Server URL: {}", server_url);
    println!("Server data dir: {:?}", server_data_dir);

    let client = Client::new();
    wait_for_server(&client, &server_url).await?;

    // Unique per run so a reused data dir does not collide
    let run_id = format!("e2e-{}", std::process::id());
    let files: Vec<(String, Vec<u8>)> = (0..TEST_FILES_COUNT)
        .map(|i| {
            let name = format!("{}-file{}.txt", run_id, i);
            let content = test_content(&name);
            (name, content)
        })
        .collect();

    let result = run(&client, &server_url, &server_data_dir, &login, &files).await;

    // Always cleanup, even on error
    for (name, _) in &files {
        let _ = admin_delete(&client, &server_url, &login, name).await;
    }

    result?;
    println!("\n✅ All E2E tests passed!");
    Ok(())
}

async fn run(
    client: &Client,
    server_url: &str,
    server_data_dir: &std::path::Path,
    login: &AdminLogin,
    files: &[(String, Vec<u8>)],
) -> Result<()> {
    let (_, before) = admin_snapshot(client, server_url, Some(login)).await?;
    let before = before.context("Admin snapshot rejected valid credentials")?;

    println!("\n📤 Testing upload...");
    for (name, content) in files {
        let (status, body) = upload_file(client, server_url, name, content.clone()).await?;
        let body = body.with_context(|| format!("Upload of {} failed with {}", name, status))?;
        if body.file.name != *name || body.file.size_bytes != content.len() as u64 {
            anyhow::bail!("Unexpected upload response for {}: {:?}", name, body.file);
        }
        if !body.direct_link.ends_with(&format!("/uploads/{}", name)) {
            anyhow::bail!("Unexpected direct link: {}", body.direct_link);
        }
    }
    println!("  ✓ Uploaded {} files", files.len());

    let (status, _) = upload_file(client, server_url, &files[0].0, b"again".to_vec()).await?;
    if status != StatusCode::BAD_REQUEST {
        anyhow::bail!("Duplicate upload answered {} instead of 400", status);
    }
    let (status, _) = upload_file(client, server_url, "../escape.txt", b"x".to_vec()).await?;
    if status != StatusCode::BAD_REQUEST {
        anyhow::bail!("Traversal upload answered {} instead of 400", status);
    }
    println!("  ✓ Duplicate and traversal uploads rejected");

    println!("\n🔍 Validating server filesystem...");
    filesystem_validator::validate_upload(server_data_dir, files)?;
    filesystem_validator::validate_no_staging_leftovers(server_data_dir)?;

    println!("\n📋 Testing list...");
    let listed = list_files(client, server_url).await?;
    for (name, _) in files {
        if !listed.files.iter().any(|f| &f.name == name) {
            anyhow::bail!("{} missing from listing", name);
        }
    }
    let names: Vec<_> = listed.files.iter().map(|f| f.name.clone()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    if names != sorted {
        anyhow::bail!("Listing is not sorted by name");
    }
    println!("  ✓ Listing contains every upload, sorted");

    println!("\n📥 Testing download through the direct link...");
    let (name, content) = &files[0];
    let link = direct_link(client, server_url, name).await?;
    if !link.ends_with(&format!("/uploads/{}", name)) {
        anyhow::bail!("Unexpected direct link for {}: {}", name, link);
    }
    let downloaded = download(client, &link)
        .await?
        .with_context(|| format!("{} not found at {}", name, link))?;
    if &downloaded != content {
        anyhow::bail!("Downloaded content differs for {}", name);
    }
    println!("  ✓ Downloaded {} ({} bytes) from {}", name, downloaded.len(), link);

    println!("\n🔐 Testing admin view...");
    let (status, _) = admin_snapshot(client, server_url, None).await?;
    if status != StatusCode::UNAUTHORIZED {
        anyhow::bail!("Anonymous admin request answered {}", status);
    }
    let (_, after) = admin_snapshot(client, server_url, Some(login)).await?;
    let after = after.context("Admin snapshot rejected valid credentials")?;
    // Counters reset at midnight; only compare within the same day
    if after.day == before.day {
        if after.uploads_today < before.uploads_today + files.len() as u64 {
            anyhow::bail!("Upload counter did not advance");
        }
        if after.downloads_today < before.downloads_today + 1 {
            anyhow::bail!("Download counter did not advance");
        }
    }
    if !after.degraded.is_empty() {
        anyhow::bail!("Admin snapshot degraded: {:?}", after.degraded);
    }
    println!(
        "  ✓ {} uploads / {} downloads today",
        after.uploads_today, after.downloads_today
    );

    println!("\n🗑️  Testing delete...");
    let deleted = admin_delete(client, server_url, login, name).await?;
    if deleted.deleted != *name {
        anyhow::bail!("Delete response names {}", deleted.deleted);
    }
    if download(client, &link).await?.is_some() {
        anyhow::bail!("{} still downloadable after delete", name);
    }
    filesystem_validator::validate_deleted(server_data_dir, name)?;

    Ok(())
}
