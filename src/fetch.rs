//! Page download from the delivery domain.

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::Context;
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::util::charset_from_content_type;

/// Download the page named by `ctx` and parse it.
///
/// The body is decoded with the `Content-Type` charset when the server sends
/// one, otherwise with the charset declared in the markup.
pub async fn fetch_page(client: &reqwest::Client, ctx: &Context) -> Result<Document> {
    let url = ctx.page_url()?;
    debug!(%url, "fetching page");

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::PageFetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let hint = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type)
        .map(str::to_string);
    let bytes = response.bytes().await?;
    debug!(len = bytes.len(), charset = ?hint, "page downloaded");

    Ok(Document::parse_bytes_with_hint(&bytes, hint.as_deref()))
}
