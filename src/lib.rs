//! Sitecanvas
//!
//! Document model, geometry and render pipeline for a drag-and-drop website
//! builder. A page's canvas is a flat list of typed elements; containers
//! refer to their children by id. The same canvas is rendered for the
//! editor and for the published site, and is flattened into a
//! render-ready feed for remote renderers.
//!
//! # Features
//!
//! - **Hybrid renderer**: one pipeline, editor or preview mode, skeleton
//!   then interactive phase
//! - **Flat render feed**: geometry and style resolved ahead of time
//! - **`server`** (default): `tiny_http` page store API and public site host
//! - **`client`** (default): blocking `reqwest` client for that API
//!
//! # Example
//!
//! ```
//! use sitecanvas::model::{Canvas, ElementType};
//! use sitecanvas::{create_element, flatten, RenderMode, Renderer};
//!
//! let mut canvas = Canvas::default();
//! canvas.push(create_element(ElementType::Button, "cta", 40.0, 40.0))?;
//!
//! let flat = flatten(&canvas);
//! assert_eq!(flat[0].width, 152.0);
//!
//! let out = Renderer::new(RenderMode::Preview).render_canvas(&canvas);
//! assert!(out.html.contains("data-element-id=\"cta\""));
//! # Ok::<(), sitecanvas::Error>(())
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result, ValidationErrors};

pub mod editor;
pub mod extract;
pub mod factory;
pub mod feed;
pub mod flatten;
pub mod geometry;
pub mod icons;
pub mod model;
pub mod rendering;
pub mod store;
pub mod upload;
pub mod validate;

// HTTP surface over the page store
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub mod client;

pub use editor::{EditorSession, PageSink, SaveState};
pub use factory::{create_element, generate_id};
pub use flatten::{flatten, FlatElement, Flatten};
pub use geometry::{resolve_actual_size, resolve_padding, Size};
pub use rendering::{RenderMode, RenderOptions, RenderOutput, RenderPhase, Renderer};
pub use store::PageStore;
pub use upload::UploadConfig;

#[cfg(feature = "server")]
pub use server::{App, Server, ShutdownHandle};

#[cfg(feature = "client")]
pub use client::HttpPageClient;

/// Configuration for the page server
///
/// Defaults bind to loopback only, keep everything in memory and treat
/// `*.localhost` hosts as published websites.
///
/// # Examples
///
/// ```
/// let cfg = sitecanvas::ServerConfig::default();
/// assert_eq!(cfg.bind, "127.0.0.1:8080");
/// assert!(cfg.data_file.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    pub bind: String,
    /// Worker threads; `None` means one per CPU
    pub workers: Option<usize>,
    /// JSON snapshot file; `None` keeps the store in memory
    pub data_file: Option<PathBuf>,
    /// Hosts `<subdomain>.<root_domain>` are served as public sites
    pub root_domain: Option<String>,
    /// Request bodies above this are rejected
    pub max_body_bytes: usize,
    /// Canvas size for pages created without content
    pub canvas: Size,
    pub upload: UploadConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            workers: None,
            data_file: None,
            root_domain: Some("localhost".to_string()),
            max_body_bytes: 2 * 1024 * 1024,
            canvas: Size::new(model::canvas::DEFAULT_CANVAS_WIDTH, model::canvas::DEFAULT_CANVAS_HEIGHT),
            upload: UploadConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| Error::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: ServerConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(Error::Config("bind address must not be empty".into()));
        }
        if self.workers == Some(0) {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max body size must be positive".into()));
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(Error::Config("canvas size must be positive".into()));
        }
        if matches!(self.root_domain.as_deref(), Some(d) if d.trim().is_empty()) {
            return Err(Error::Config("root domain must not be blank".into()));
        }
        upload::UploadSigner::new(&self.upload).map(|_| ())
    }

    /// Build the store this config describes, loading the data file when set.
    pub fn open_store(&self) -> Result<PageStore> {
        let store = match &self.data_file {
            Some(path) => PageStore::open(path)?,
            None => PageStore::new(),
        };
        Ok(store.with_default_canvas(self.canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.root_domain.as_deref(), Some("localhost"));
        assert_eq!(config.canvas, Size::new(1200.0, 800.0));
        assert!(config.workers.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_config_json() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"bind":"0.0.0.0:9000","workers":2,"canvas":{"width":800,"height":600}}"#)
                .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.max_body_bytes, ServerConfig::default().max_body_bytes);
        let store = config.open_store().unwrap();
        let page = store.create_page(store::NewPage { title: Some("Home".into()), ..Default::default() }).unwrap();
        assert_eq!(page.content.width, 800.0);
    }

    #[test]
    fn test_invalid_config() {
        let zero = ServerConfig { workers: Some(0), ..Default::default() };
        assert!(matches!(zero.validate(), Err(Error::Config(_))));
        let blank = ServerConfig { root_domain: Some(" ".into()), ..Default::default() };
        assert!(blank.validate().is_err());
    }
}
