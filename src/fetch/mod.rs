//! HTTP transport used by the statistics API client.
//!
//! [`HttpClient`] is the seam between request building and the wire so the
//! API client can run against a scripted transport in tests.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::FetchError;

/// Issues a GET to `url` and decodes the JSON body.
///
/// Anything other than `200 OK` is a [`FetchError::HttpStatus`]. An empty body
/// or a literal `null` decodes to `Ok(None)` so callers can decide whether an
/// absent payload is acceptable for their endpoint.
pub async fn fetch_json<C, T>(client: &C, url: &str) -> Result<Option<T>, FetchError>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Err(FetchError::HttpStatus { status });
    }

    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Response body received");

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    Ok(serde_json::from_slice::<Option<T>>(&bytes)?)
}
