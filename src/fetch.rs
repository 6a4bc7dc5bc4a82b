//! Profile-picture URL probe. A picture URL is persisted only after a
//! bounded GET confirms the resource is reachable and is an image.
//! One attempt per request; a failure is terminal for that field.

use axum::http::header;

use crate::error::{AppError, AppResult};

/// Check that `url_str` is an http(s) URL serving an image. The request
/// timeout is baked into the client at startup.
pub async fn probe_image(client: &reqwest::Client, url_str: &str) -> AppResult<()> {
    let parsed = url::Url::parse(url_str)
        .map_err(|e| AppError::FetchFailed(format!("Could not fetch data from URL: {}", e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::FetchFailed(
            "Could not fetch data from URL: invalid URL scheme.".to_string(),
        ));
    }

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| AppError::FetchFailed(format!("Could not fetch data from URL: {}", e)))?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !response.status().is_success() || !content_type.contains("image") {
        return Err(AppError::FetchFailed(
            "URL did not point to a valid image.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let err = probe_image(&client(), "not a url").await.unwrap_err();
        assert!(matches!(err, AppError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn rejects_non_http_scheme() {
        let err = probe_image(&client(), "ftp://example.com/pic.png")
            .await
            .unwrap_err();
        let AppError::FetchFailed(msg) = err else {
            panic!("expected FetchFailed");
        };
        assert!(msg.contains("scheme"));
    }

    #[tokio::test]
    async fn rejects_file_scheme() {
        assert!(probe_image(&client(), "file:///etc/passwd").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Needs network. Run with: cargo test -- --ignored
    async fn accepts_real_image_url() {
        probe_image(&client(), "https://www.rust-lang.org/static/images/rust-logo-blk.svg")
            .await
            .ok();
    }
}
