//! HTTP surface over a shared [`PageStore`].
//!
//! [`App`] maps one request to one response and knows nothing about
//! sockets, so routes are testable without a listener. [`Server`] runs
//! `App` on a `tiny_http` listener with a fixed pool of worker threads.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::feed::{PageFeed, WebsiteFeed};
use crate::model::Page;
use crate::rendering::html::escape;
use crate::rendering::{RenderMode, Renderer};
use crate::store::{NewPage, NewWebsite, PageStore, PageUpdate};
use crate::upload::UploadSigner;
use crate::{Error, Result, ServerConfig};

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Transport-independent request.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: &'a str,
    /// Path plus optional query, as received.
    pub url: &'a str,
    pub host: Option<&'a str>,
    pub if_none_match: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> HttpRequest<'a> {
    pub fn new(method: &'a str, url: &'a str) -> Self {
        Self { method, url, host: None, if_none_match: None, body: &[] }
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = body;
        self
    }

    pub fn with_host(mut self, host: &'a str) -> Self {
        self.host = Some(host);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self { status, headers: vec![("Content-Type".to_string(), content_type.to_string())], body }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, JSON, body),
            Err(err) => Self::from_error(&Error::from(err)),
        }
    }

    pub fn html(status: u16, body: String) -> Self {
        Self::new(status, HTML, body.into_bytes())
    }

    pub fn from_error(err: &Error) -> Self {
        let status = err.status_code();
        let body = match err {
            Error::Validation(fields) => json!({ "error": err.to_string(), "fields": fields }),
            _ => json!({ "error": err.to_string() }),
        };
        Self::new(status, JSON, body.to_string().into_bytes())
    }

    fn method_not_allowed(method: &str) -> Self {
        let body = json!({ "error": format!("method {} not allowed", method) });
        Self::new(405, JSON, body.to_string().into_bytes())
    }

    fn not_found(path: &str) -> Self {
        let body = json!({ "error": format!("no route for {}", path) });
        Self::new(404, JSON, body.to_string().into_bytes())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest {
    filename: String,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

struct Target {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Target {
    fn parse(url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        let query = url::form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Self { segments, query }
    }

    fn query(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Request router over the store and upload signer.
pub struct App {
    store: Arc<PageStore>,
    signer: UploadSigner,
    root_domain: Option<String>,
}

impl App {
    pub fn new(store: Arc<PageStore>, config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            store,
            signer: UploadSigner::new(&config.upload)?,
            root_domain: config.root_domain.clone(),
        })
    }

    pub fn store(&self) -> &Arc<PageStore> {
        &self.store
    }

    pub fn handle(&self, req: &HttpRequest<'_>) -> HttpResponse {
        let method = req.method.to_ascii_uppercase();
        let target = Target::parse(req.url);
        log::debug!("{} {}", method, req.url);

        if let Some(host) = req.host {
            if let Some(site) = self.store.website_for_host(host, self.root_domain.as_deref()) {
                return self.public_site(&method, &site.id, &target);
            }
        }

        match self.route(&method, &target, req) {
            Ok(resp) => {
                if !matches!(method.as_str(), "GET" | "HEAD") && resp.status < 300 {
                    if let Err(err) = self.store.flush() {
                        log::warn!("could not persist store after {} {}: {}", method, req.url, err);
                    }
                }
                resp
            }
            Err(err) => {
                if err.status_code() >= 500 {
                    log::warn!("{} {} failed: {}", method, req.url, err);
                }
                HttpResponse::from_error(&err)
            }
        }
    }

    fn route(&self, method: &str, target: &Target, req: &HttpRequest<'_>) -> Result<HttpResponse> {
        let segs: Vec<&str> = target.segments.iter().map(String::as_str).collect();
        let store = &self.store;
        let resp = match (method, segs.as_slice()) {
            ("GET", ["pages"]) => {
                let pages = store.list_pages(target.query("websiteId"));
                HttpResponse::json(200, &json!({ "pages": pages }))
            }
            ("POST", ["pages"]) => {
                let page = store.create_page(parse_body::<NewPage>(req.body)?)?;
                HttpResponse::json(201, &json!({ "page": page }))
            }
            (_, ["pages"]) => HttpResponse::method_not_allowed(method),

            ("GET", ["pages", "path", rest @ ..]) => {
                let path = format!("/{}", rest.join("/"));
                let page = store
                    .resolve_path(target.query("websiteId"), &path)
                    .ok_or_else(|| Error::not_found("page", path))?;
                HttpResponse::json(200, &json!({ "page": page }))
            }
            (_, ["pages", "path", ..]) => HttpResponse::method_not_allowed(method),

            ("GET", ["pages", id]) => {
                let page = store.get_page(id).ok_or_else(|| Error::not_found("page", *id))?;
                HttpResponse::json(200, &json!({ "page": page }))
            }
            ("PUT", ["pages", id]) => {
                let update: PageUpdate = parse_body(req.body)?;
                if update.canvas.is_none() {
                    return Err(Error::invalid("canvas", "is required"));
                }
                let page = store.update_page(id, update)?;
                HttpResponse::json(200, &json!({ "page": page }))
            }
            ("DELETE", ["pages", id]) => {
                let page = store.delete_page(id)?;
                HttpResponse::json(200, &json!({ "page": page }))
            }
            (_, ["pages", _]) => HttpResponse::method_not_allowed(method),

            ("POST", ["pages", id, action @ ("publish" | "unpublish")]) => {
                let page = store.set_page_published(id, *action == "publish")?;
                HttpResponse::json(200, &json!({ "page": page }))
            }

            ("GET", ["render", "website", id]) => {
                let site = store.get_website(id).ok_or_else(|| Error::not_found("website", *id))?;
                let pages = store.website_pages(id).unwrap_or_default();
                HttpResponse::json(200, &WebsiteFeed::new(&site, &pages))
            }
            ("GET", ["render", id]) => {
                let page = store.get_page(id).ok_or_else(|| Error::not_found("page", *id))?;
                let feed = PageFeed::from_page(&page);
                let etag = format!("\"{}\"", feed.etag());
                if req.if_none_match == Some(etag.as_str()) {
                    HttpResponse::new(304, JSON, Vec::new()).with_header("ETag", etag)
                } else {
                    HttpResponse::json(200, &feed).with_header("ETag", etag)
                }
            }
            (_, ["render", ..]) => HttpResponse::method_not_allowed(method),

            ("GET", ["websites"]) => HttpResponse::json(200, &json!({ "websites": store.list_websites() })),
            ("POST", ["websites"]) => {
                let site = store.create_website(parse_body::<NewWebsite>(req.body)?)?;
                HttpResponse::json(201, &json!({ "website": site }))
            }
            (_, ["websites"]) => HttpResponse::method_not_allowed(method),
            ("GET", ["websites", id]) => {
                let site = store.get_website(id).ok_or_else(|| Error::not_found("website", *id))?;
                let pages = store.website_pages(id).unwrap_or_default();
                HttpResponse::json(200, &json!({ "website": site, "pages": pages }))
            }
            ("DELETE", ["websites", id]) => {
                let site = store.delete_website(id)?;
                HttpResponse::json(200, &json!({ "website": site }))
            }
            (_, ["websites", _]) => HttpResponse::method_not_allowed(method),
            ("POST", ["websites", id, action @ ("publish" | "unpublish")]) => {
                let site = store.set_website_published(id, *action == "publish")?;
                HttpResponse::json(200, &json!({ "website": site }))
            }

            ("POST", ["uploads", "presign"]) => {
                let body: PresignRequest = parse_body(req.body)?;
                if body.filename.trim().is_empty() {
                    return Err(Error::invalid("filename", "is required"));
                }
                HttpResponse::json(200, &self.signer.presign_put(&body.filename, Utc::now())?)
            }
            (_, ["uploads", "presign"]) => HttpResponse::method_not_allowed(method),

            _ => HttpResponse::not_found(&target.path()),
        };
        Ok(resp)
    }

    /// Published pages of a host-addressed website, as HTML documents.
    fn public_site(&self, method: &str, site_id: &str, target: &Target) -> HttpResponse {
        if method != "GET" && method != "HEAD" {
            return HttpResponse::method_not_allowed(method);
        }
        match self.store.resolve_path(Some(site_id), &target.path()) {
            Some(page) => HttpResponse::html(200, page_document(&page)),
            None => HttpResponse::html(404, "<!DOCTYPE html><title>Not found</title><h1>Page not found</h1>".into()),
        }
    }
}

/// Standalone HTML document for a published page, links live.
pub fn page_document(page: &Page) -> String {
    let body = Renderer::new(RenderMode::Preview).hydrate().render_canvas(&page.content).html;
    let title = page.metadata.title.as_deref().unwrap_or(&page.title);
    let mut head = format!("<meta charset=\"utf-8\"><title>{}</title>", escape(title));
    let meta = &page.metadata;
    for (attr, name, value) in [
        ("name", "description", &meta.description),
        ("property", "og:title", &meta.og_title),
        ("property", "og:description", &meta.og_description),
        ("property", "og:image", &meta.og_image),
    ] {
        if let Some(v) = value {
            head.push_str(&format!("<meta {}=\"{}\" content=\"{}\">", attr, name, escape(v)));
        }
    }
    format!("<!DOCTYPE html><html><head>{}</head><body>{}</body></html>", head, body)
}

fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn serve_one(app: &App, mut request: tiny_http::Request, max_body: usize) {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();
    let host = header_value(&request, "Host");
    let if_none_match = header_value(&request, "If-None-Match");

    let mut body = Vec::new();
    let read = request.as_reader().take(max_body as u64 + 1).read_to_end(&mut body);
    let response = match read {
        Err(err) => HttpResponse::from_error(&Error::from(err)),
        Ok(_) if body.len() > max_body => HttpResponse::from_error(&Error::invalid(
            "body",
            format!("request body exceeds {} bytes", max_body),
        )),
        Ok(_) => app.handle(&HttpRequest {
            method: &method,
            url: &url,
            host: host.as_deref(),
            if_none_match: if_none_match.as_deref(),
            body: &body,
        }),
    };

    let status = response.status;
    let mut out = tiny_http::Response::from_data(response.body).with_status_code(status);
    for (name, value) in &response.headers {
        if let Ok(header) = tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            out.add_header(header);
        }
    }
    if let Err(err) = request.respond(out) {
        log::warn!("{} {}: failed to send response: {}", method, url, err);
    } else {
        log::info!("{} {} -> {}", method, url, status);
    }
}

/// Stops a [`Server`] from another thread, e.g. a signal handler.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    http: Arc<tiny_http::Server>,
}

impl ShutdownHandle {
    /// Ask the workers to exit; [`Server::wait`] returns once they have.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
        self.http.unblock();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A running listener. Dropping it stops the workers.
pub struct Server {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    http: Arc<tiny_http::Server>,
    workers: Vec<JoinHandle<()>>,
}

impl Server {
    /// Bind `config.bind` and start the worker pool.
    pub fn bind(config: &ServerConfig, store: Arc<PageStore>) -> Result<Self> {
        let app = Arc::new(App::new(store, config)?);
        let http = tiny_http::Server::http(config.bind.as_str())
            .map_err(|e| Error::Config(format!("cannot bind {}: {}", config.bind, e)))?;
        let addr = http
            .server_addr()
            .to_ip()
            .ok_or_else(|| Error::Config(format!("{} is not an IP listener", config.bind)))?;
        let http = Arc::new(http);
        let shutdown = Arc::new(AtomicBool::new(false));
        let count = config.workers.unwrap_or_else(num_cpus::get).max(1);
        let max_body = config.max_body_bytes;

        let workers = (0..count)
            .map(|n| {
                let http = Arc::clone(&http);
                let app = Arc::clone(&app);
                let shutdown = Arc::clone(&shutdown);
                thread::Builder::new()
                    .name(format!("sitecanvas-http-{}", n))
                    .spawn(move || {
                        while !shutdown.load(Ordering::Relaxed) {
                            match http.recv_timeout(POLL_INTERVAL) {
                                Ok(Some(request)) => serve_one(&app, request, max_body),
                                Ok(None) => {}
                                Err(err) => {
                                    log::warn!("listener error: {}", err);
                                    break;
                                }
                            }
                        }
                    })
                    .map_err(Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("listening on http://{} with {} workers", addr, count);
        Ok(Self { addr, shutdown, http, workers })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { flag: Arc::clone(&self.shutdown), http: Arc::clone(&self.http) }
    }

    /// Block until the workers exit, i.e. until a [`ShutdownHandle`] fires.
    pub fn wait(mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.http.unblock();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::info!("server on {} stopped", self.addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn app() -> App {
        App::new(Arc::new(PageStore::new()), &ServerConfig::default()).unwrap()
    }

    fn body(resp: &HttpResponse) -> Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    fn create(app: &App, title: &str) -> String {
        let payload = json!({ "title": title }).to_string();
        let resp = app.handle(&HttpRequest::new("POST", "/pages").with_body(payload.as_bytes()));
        assert_eq!(resp.status, 201);
        body(&resp)["page"]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn page_crud() {
        let app = app();
        let id = create(&app, "Home");

        let resp = app.handle(&HttpRequest::new("GET", &format!("/pages/{}", id)));
        assert_eq!(body(&resp)["page"]["title"], "Home");

        let update = json!({ "canvas": { "width": 640, "elements": [] } }).to_string();
        let resp = app.handle(&HttpRequest::new("PUT", &format!("/pages/{}", id)).with_body(update.as_bytes()));
        assert_eq!(resp.status, 200);
        assert_eq!(body(&resp)["page"]["content"]["width"], 640.0);

        let resp = app.handle(&HttpRequest::new("DELETE", &format!("/pages/{}", id)));
        assert_eq!(resp.status, 200);
        let resp = app.handle(&HttpRequest::new("GET", &format!("/pages/{}", id)));
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn missing_fields_are_400_with_field_messages() {
        let app = app();
        let resp = app.handle(&HttpRequest::new("POST", "/pages").with_body(b"{}"));
        assert_eq!(resp.status, 400);
        assert!(body(&resp)["fields"]["title"].is_array());

        let id = create(&app, "Home");
        let resp = app.handle(&HttpRequest::new("PUT", &format!("/pages/{}", id)).with_body(b"{\"title\":\"x\"}"));
        assert_eq!(resp.status, 400);
        assert!(body(&resp)["fields"]["canvas"].is_array());
    }

    #[test]
    fn unknown_routes_and_methods() {
        let app = app();
        assert_eq!(app.handle(&HttpRequest::new("GET", "/nope")).status, 404);
        assert_eq!(app.handle(&HttpRequest::new("PATCH", "/pages")).status, 405);
    }

    #[test]
    fn render_feed_has_etag_and_honours_if_none_match() {
        let app = app();
        let id = create(&app, "Home");
        let url = format!("/render/{}", id);
        let resp = app.handle(&HttpRequest::new("GET", &url));
        assert_eq!(resp.status, 200);
        let etag = resp.header("ETag").unwrap().to_string();
        let mut req = HttpRequest::new("GET", &url);
        req.if_none_match = Some(&etag);
        assert_eq!(app.handle(&req).status, 304);
    }

    #[test]
    fn path_resolution_requires_publish() {
        let app = app();
        let id = create(&app, "About Us");
        assert_eq!(app.handle(&HttpRequest::new("GET", "/pages/path/about-us")).status, 404);
        app.handle(&HttpRequest::new("POST", &format!("/pages/{}/publish", id)));
        let resp = app.handle(&HttpRequest::new("GET", "/pages/path/about-us"));
        assert_eq!(body(&resp)["page"]["id"], id.as_str());
    }

    #[test]
    fn path_lookup_is_read_only() {
        let app = app();
        for method in ["PUT", "DELETE", "POST"] {
            let resp = app.handle(&HttpRequest::new(method, "/pages/path/about-us"));
            assert_eq!(resp.status, 405, "{}", method);
        }
        // an encoded slash stays inside the id segment
        let resp = app.handle(&HttpRequest::new("GET", "/pages/a%2Fb"));
        assert_eq!(resp.status, 404);
        assert!(body(&resp)["error"].as_str().unwrap().contains("a/b"));
    }

    #[test]
    fn shutdown_handle_releases_wait() {
        let config = ServerConfig { bind: "127.0.0.1:0".into(), workers: Some(2), ..Default::default() };
        let server = Server::bind(&config, Arc::new(PageStore::new())).unwrap();
        let handle = server.shutdown_handle();
        assert!(!handle.is_triggered());
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.trigger();
        });
        server.wait();
        stopper.join().unwrap();
    }

    #[test]
    fn subdomain_hosts_serve_published_html() {
        let app = app();
        let site = app
            .store()
            .create_website(NewWebsite { subdomain: "acme".into(), ..Default::default() })
            .unwrap();
        let page = app
            .store()
            .create_page(NewPage {
                title: Some("Home".into()),
                path: Some("/".into()),
                website_id: Some(site.id.clone()),
                ..Default::default()
            })
            .unwrap();
        app.store().set_page_published(&page.id, true).unwrap();

        let req = HttpRequest::new("GET", "/").with_host("acme.localhost:8080");
        assert_eq!(app.handle(&req).status, 404);
        app.store().set_website_published(&site.id, true).unwrap();
        let resp = app.handle(&req);
        assert_eq!(resp.status, 200);
        assert!(resp.body_text().contains("<title>Home</title>"));
        assert!(resp.body_text().contains("sc-canvas"));
    }

    #[test]
    fn presign_returns_urls() {
        let app = app();
        let resp = app.handle(&HttpRequest::new("POST", "/uploads/presign").with_body(b"{\"filename\":\"a b.png\"}"));
        assert_eq!(resp.status, 200);
        let v = body(&resp);
        assert!(v["publicUrl"].as_str().unwrap().ends_with("-a-b.png"));
        assert!(v["uploadUrl"].as_str().unwrap().contains("signature="));
    }
}
