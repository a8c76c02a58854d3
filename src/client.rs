//! Blocking HTTP client for a remote page store.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::editor::PageSink;
use crate::error::ValidationErrors;
use crate::feed::PageFeed;
use crate::model::{Canvas, Page};
use crate::upload::PresignedUpload;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Everything that would end or split a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct PageEnvelope {
    page: Page,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: String,
    fields: Option<ValidationErrors>,
}

/// Talks to the `/pages`, `/render` and `/uploads` routes of a server.
#[derive(Debug, Clone)]
pub struct HttpPageClient {
    base: Url,
    http: Client,
}

impl HttpPageClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| Error::Config(format!("base url: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { base, http })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("bad endpoint {}: {}", path, e)))
    }

    /// `{collection}/{id}` with `id` encoded as one path segment.
    fn item_endpoint(&self, collection: &str, id: &str) -> Result<Url> {
        self.endpoint(&format!("{}/{}", collection, utf8_percent_encode(id, SEGMENT)))
    }

    /// Turn a non-success response into the matching error kind.
    fn check(resp: Response, what: &str) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body: ErrorBody = resp.json().unwrap_or_default();
        Err(match status {
            StatusCode::BAD_REQUEST => match body.fields {
                Some(fields) if !fields.is_empty() => Error::Validation(fields),
                _ => Error::invalid("request", body.error),
            },
            StatusCode::NOT_FOUND => Error::not_found("page", what),
            StatusCode::CONFLICT => Error::Conflict(body.error),
            _ => Error::Network(format!("{} returned {}: {}", what, status, body.error)),
        })
    }

    fn page_from(resp: Response, what: &str) -> Result<Page> {
        let envelope: PageEnvelope = Self::check(resp, what)?.json()?;
        Ok(envelope.page)
    }

    fn json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
        Ok(Self::check(resp, what)?.json()?)
    }

    pub fn create_page(&self, title: &str, canvas: Option<&Canvas>) -> Result<Page> {
        let resp = self
            .http
            .post(self.endpoint("pages")?)
            .json(&json!({ "title": title, "canvas": canvas }))
            .send()?;
        Self::page_from(resp, title)
    }

    /// `Ok(None)` when the page doesn't exist.
    pub fn get_page(&self, id: &str) -> Result<Option<Page>> {
        let resp = self.http.get(self.item_endpoint("pages", id)?).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::page_from(resp, id).map(Some)
    }

    pub fn update_page(&self, id: &str, title: Option<&str>, canvas: &Canvas) -> Result<Page> {
        let mut body = json!({ "canvas": canvas });
        if let Some(title) = title {
            body["title"] = json!(title);
        }
        let resp = self.http.put(self.item_endpoint("pages", id)?).json(&body).send()?;
        Self::page_from(resp, id)
    }

    pub fn delete_page(&self, id: &str) -> Result<()> {
        let resp = self.http.delete(self.item_endpoint("pages", id)?).send()?;
        Self::check(resp, id).map(|_| ())
    }

    /// Render feed and its `ETag`.
    pub fn render_feed(&self, id: &str) -> Result<(PageFeed, Option<String>)> {
        let resp = self.http.get(self.item_endpoint("render", id)?).send()?;
        let etag = resp
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());
        let feed = Self::json(resp, id)?;
        Ok((feed, etag))
    }

    pub fn presign_upload(&self, filename: &str) -> Result<PresignedUpload> {
        let resp = self
            .http
            .post(self.endpoint("uploads/presign")?)
            .json(&json!({ "filename": filename }))
            .send()?;
        Self::json(resp, filename)
    }
}

impl PageSink for HttpPageClient {
    fn save_canvas(&self, page_id: &str, canvas: &Canvas) -> Result<()> {
        self.update_page(page_id, None, canvas).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let c = HttpPageClient::new("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(c.endpoint("/pages/x").unwrap().as_str(), "http://127.0.0.1:8080/api/pages/x");
    }

    #[test]
    fn ids_stay_inside_one_path_segment() {
        let c = HttpPageClient::new("http://127.0.0.1:8080/api").unwrap();
        let url = c.item_endpoint("pages", "a/b c?x#y%").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/pages/a%2Fb%20c%3Fx%23y%25");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn bad_base_url_is_config_error() {
        assert!(matches!(HttpPageClient::new("not a url"), Err(Error::Config(_))));
    }

    #[test]
    fn unreachable_server_is_network_error() {
        let c = HttpPageClient::with_timeout("http://127.0.0.1:9/", Duration::from_millis(200)).unwrap();
        assert!(matches!(c.get_page("x"), Err(Error::Network(_))));
    }
}
