//! HTTP utilities for downloading release artifacts.
//!
//! Redirects are handled by hand: a response carrying a `Location` header is
//! retried once against that URL, and a second redirect is an error.

use crate::release::error::{Error, ErrorExt, Result};
use futures_lite::StreamExt;
use reqwest::{Client, Response, header::LOCATION, redirect::Policy};
use std::path::Path;
use tokio::{fs::File, io::AsyncWriteExt};
use url::Url;

/// Builds the client used for release downloads.
///
/// Automatic redirects are disabled so that the single-hop rule holds.
pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .redirect(Policy::none())
        .user_agent(concat!("lumea_release/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Returns the redirect target of `response`, resolved against the request URL.
fn redirect_target(response: &Response) -> Result<Option<Url>> {
    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };
    let location = location.to_str().map_err(|e| Error::Download {
        url: response.url().to_string(),
        reason: format!("invalid Location header: {e}"),
    })?;
    Ok(Some(response.url().join(location)?))
}

/// Issues a GET, following at most one redirect.
pub async fn get_following_one_redirect(client: &Client, url: &str) -> Result<Response> {
    let download_error = |url: &str, reason: String| Error::Download {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| download_error(url, e.to_string()))?;

    let response = match redirect_target(&response)? {
        Some(target) => {
            log::info!("Redirecting to {}", target);
            let redirected = client
                .get(target.clone())
                .send()
                .await
                .map_err(|e| download_error(target.as_str(), e.to_string()))?;
            if redirected.headers().contains_key(LOCATION) {
                return Err(download_error(
                    url,
                    format!("too many redirects (second hop from {target})"),
                ));
            }
            redirected
        }
        None => response,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(download_error(
            response.url().as_str(),
            format!("server responded with {status}"),
        ));
    }
    Ok(response)
}

/// Downloads `url` to `dest`.
///
/// On any failure the partially written file is closed and then removed, so
/// `dest` never holds a truncated artifact.
pub async fn download_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    let response = get_following_one_redirect(client, url).await?;

    let file = File::create(dest)
        .await
        .fs_context("creating download destination", dest)?;

    let result = stream_body(response, file, url, dest).await;

    if result.is_err() {
        // `stream_body` owns the handle, so it is closed by the time we get here.
        if let Err(e) = tokio::fs::remove_file(dest).await {
            log::warn!("Failed to remove partial download {}: {}", dest.display(), e);
        }
    }
    result
}

async fn stream_body(response: Response, mut file: File, url: &str, dest: &Path) -> Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.write_all(&chunk)
            .await
            .fs_context("writing download", dest)?;
        written += chunk.len() as u64;
    }

    file.flush().await.fs_context("flushing download", dest)?;
    file.sync_all().await.fs_context("syncing download", dest)?;
    Ok(written)
}
