//! In-memory website/page store with optional JSON snapshot persistence.
//!
//! One `PageStore` is built at startup and shared as `Arc<PageStore>` by
//! every request handler. All state sits behind a single `RwLock`, so each
//! operation sees and leaves a consistent snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::editor::PageSink;
use crate::error::ValidationErrors;
use crate::factory::generate_id;
use crate::geometry::Size;
use crate::model::{Canvas, Page, PageMetadata, Website};
use crate::validate::{normalize_path, slugify, validate_domain, validate_subdomain, validate_title};
use crate::{Error, Result};

/// Fields accepted when creating a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPage {
    pub title: Option<String>,
    pub path: Option<String>,
    pub website_id: Option<String>,
    pub canvas: Option<Canvas>,
    pub metadata: Option<PageMetadata>,
}

/// Fields accepted when saving a page. Absent fields are left alone; a
/// present canvas replaces the stored one wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub path: Option<String>,
    pub canvas: Option<Canvas>,
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWebsite {
    pub name: Option<String>,
    pub subdomain: String,
    pub domain: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snapshot {
    websites: BTreeMap<String, Website>,
    pages: BTreeMap<String, Page>,
}

impl Snapshot {
    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id();
            if !self.pages.contains_key(&id) && !self.websites.contains_key(&id) {
                return id;
            }
        }
    }

    fn path_taken(&self, website_id: Option<&str>, path: &str, except: Option<&str>) -> bool {
        self.pages.values().any(|p| {
            p.website_id.as_deref() == website_id && p.path == path && Some(p.id.as_str()) != except
        })
    }
}

#[derive(Debug, Default)]
pub struct PageStore {
    inner: RwLock<Snapshot>,
    data_file: Option<PathBuf>,
    default_canvas: Option<Size>,
    // one writer of the temp file at a time
    flush_lock: Mutex<()>,
}

impl PageStore {
    /// Empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by `path`. Loads it when it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let bytes = fs::read(&path)?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            log::info!(
                "loaded {} websites and {} pages from {}",
                snapshot.websites.len(),
                snapshot.pages.len(),
                path.display()
            );
            snapshot
        } else {
            Snapshot::default()
        };
        Ok(Self { inner: RwLock::new(snapshot), data_file: Some(path), ..Self::default() })
    }

    /// Size given to pages created without a canvas.
    pub fn with_default_canvas(mut self, size: Size) -> Self {
        self.default_canvas = Some(size);
        self
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    fn empty_canvas(&self) -> Canvas {
        match self.default_canvas {
            Some(size) => Canvas::new(size.width, size.height),
            None => Canvas::default(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // ---- pages ----

    pub fn create_page(&self, new: NewPage) -> Result<Page> {
        let mut errors = ValidationErrors::new();
        validate_title(new.title.as_deref(), &mut errors);
        errors.into_result()?;
        let title = new.title.unwrap_or_default().trim().to_string();
        let path = match new.path.as_deref() {
            Some(raw) if !raw.trim().is_empty() => normalize_path(raw)?,
            _ => format!("/{}", slugify(&title)),
        };

        let mut inner = self.write();
        if let Some(site) = &new.website_id {
            if !inner.websites.contains_key(site) {
                return Err(Error::not_found("website", site.as_str()));
            }
        }
        if inner.path_taken(new.website_id.as_deref(), &path, None) {
            return Err(Error::Conflict(format!("path '{}' already exists", path)));
        }

        let now = Utc::now();
        let page = Page {
            id: inner.fresh_id(),
            website_id: new.website_id,
            title,
            path,
            content: match new.canvas {
                Some(canvas) => canvas.without_selection(),
                None => self.empty_canvas(),
            },
            metadata: new.metadata.unwrap_or_default(),
            is_published: false,
            created_at: now,
            updated_at: now,
        };
        if let Some(site) = page.website_id.as_ref().and_then(|id| inner.websites.get_mut(id)) {
            site.page_ids.push(page.id.clone());
            site.updated_at = now;
        }
        inner.pages.insert(page.id.clone(), page.clone());
        log::info!("created page '{}' at {}", page.id, page.path);
        Ok(page)
    }

    pub fn get_page(&self, id: &str) -> Option<Page> {
        self.read().pages.get(id).cloned()
    }

    /// Pages oldest first, optionally limited to one website.
    pub fn list_pages(&self, website_id: Option<&str>) -> Vec<Page> {
        let inner = self.read();
        let mut pages: Vec<Page> = inner
            .pages
            .values()
            .filter(|p| website_id.is_none() || p.website_id.as_deref() == website_id)
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        pages
    }

    pub fn update_page(&self, id: &str, update: PageUpdate) -> Result<Page> {
        let mut errors = ValidationErrors::new();
        if update.title.is_some() {
            validate_title(update.title.as_deref(), &mut errors);
        }
        errors.into_result()?;
        let path = update.path.as_deref().map(normalize_path).transpose()?;

        let mut inner = self.write();
        let website_id = match inner.pages.get(id) {
            Some(p) => p.website_id.clone(),
            None => return Err(Error::not_found("page", id)),
        };
        if let Some(path) = &path {
            if inner.path_taken(website_id.as_deref(), path, Some(id)) {
                return Err(Error::Conflict(format!("path '{}' already exists", path)));
            }
        }
        let page = inner.pages.get_mut(id).ok_or_else(|| Error::not_found("page", id))?;
        if let Some(title) = update.title {
            page.title = title.trim().to_string();
        }
        if let Some(path) = path {
            page.path = path;
        }
        if let Some(canvas) = update.canvas {
            page.content = canvas.without_selection();
        }
        if let Some(metadata) = update.metadata {
            page.metadata = metadata;
        }
        page.updated_at = Utc::now();
        log::info!("saved page '{}' ({} elements)", id, page.content.len());
        Ok(page.clone())
    }

    /// Replace a page's canvas wholesale.
    pub fn replace_canvas(&self, id: &str, canvas: Canvas) -> Result<Page> {
        self.update_page(id, PageUpdate { canvas: Some(canvas), ..Default::default() })
    }

    /// Physical delete.
    pub fn delete_page(&self, id: &str) -> Result<Page> {
        let mut inner = self.write();
        let page = inner.pages.remove(id).ok_or_else(|| Error::not_found("page", id))?;
        if let Some(site) = page.website_id.as_ref().and_then(|w| inner.websites.get_mut(w)) {
            site.page_ids.retain(|p| p != id);
        }
        log::info!("deleted page '{}'", id);
        Ok(page)
    }

    pub fn set_page_published(&self, id: &str, published: bool) -> Result<Page> {
        let mut inner = self.write();
        let page = inner.pages.get_mut(id).ok_or_else(|| Error::not_found("page", id))?;
        page.is_published = published;
        page.updated_at = Utc::now();
        Ok(page.clone())
    }

    /// Published page at `path`.
    ///
    /// With `website_id`, only that website's pages match and the website
    /// itself must be published. Without one, only pages that belong to no
    /// website match, so two sites sharing a path never shadow each other.
    pub fn resolve_path(&self, website_id: Option<&str>, path: &str) -> Option<Page> {
        let path = normalize_path(path).ok()?;
        let inner = self.read();
        if let Some(site) = website_id {
            if !inner.websites.get(site).is_some_and(|w| w.is_published) {
                return None;
            }
        }
        inner
            .pages
            .values()
            .find(|p| p.is_published && p.path == path && p.website_id.as_deref() == website_id)
            .cloned()
    }

    // ---- websites ----

    pub fn create_website(&self, new: NewWebsite) -> Result<Website> {
        let subdomain = new.subdomain.trim().to_ascii_lowercase();
        validate_subdomain(&subdomain)?;
        let domain = new
            .domain
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty());
        if let Some(d) = &domain {
            validate_domain(d)?;
        }

        let mut inner = self.write();
        if inner.websites.values().any(|w| w.subdomain == subdomain) {
            return Err(Error::Conflict(format!("subdomain '{}' is taken", subdomain)));
        }
        if let Some(d) = &domain {
            if inner.websites.values().any(|w| w.domain.as_ref() == Some(d)) {
                return Err(Error::Conflict(format!("domain '{}' is taken", d)));
            }
        }
        let now = Utc::now();
        let website = Website {
            id: inner.fresh_id(),
            name: new.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| subdomain.clone()),
            subdomain,
            domain,
            is_published: false,
            page_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.websites.insert(website.id.clone(), website.clone());
        log::info!("created website '{}' ({})", website.id, website.subdomain);
        Ok(website)
    }

    pub fn get_website(&self, id: &str) -> Option<Website> {
        self.read().websites.get(id).cloned()
    }

    pub fn list_websites(&self) -> Vec<Website> {
        let mut sites: Vec<Website> = self.read().websites.values().cloned().collect();
        sites.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sites
    }

    /// Delete a website and every page it owns.
    pub fn delete_website(&self, id: &str) -> Result<Website> {
        let mut inner = self.write();
        let website = inner.websites.remove(id).ok_or_else(|| Error::not_found("website", id))?;
        let before = inner.pages.len();
        inner.pages.retain(|_, p| p.website_id.as_deref() != Some(id));
        log::info!("deleted website '{}' and {} pages", id, before - inner.pages.len());
        Ok(website)
    }

    pub fn set_website_published(&self, id: &str, published: bool) -> Result<Website> {
        let mut inner = self.write();
        let site = inner.websites.get_mut(id).ok_or_else(|| Error::not_found("website", id))?;
        site.is_published = published;
        site.updated_at = Utc::now();
        Ok(site.clone())
    }

    /// The website's pages in their stored order.
    pub fn website_pages(&self, id: &str) -> Option<Vec<Page>> {
        let inner = self.read();
        let site = inner.websites.get(id)?;
        Some(site.page_ids.iter().filter_map(|p| inner.pages.get(p).cloned()).collect())
    }

    pub fn website_by_subdomain(&self, subdomain: &str) -> Option<Website> {
        let wanted = subdomain.trim().to_ascii_lowercase();
        self.read().websites.values().find(|w| w.subdomain == wanted).cloned()
    }

    /// Website serving `host`, by custom domain or `<subdomain>.<root_domain>`.
    pub fn website_for_host(&self, host: &str, root_domain: Option<&str>) -> Option<Website> {
        self.read()
            .websites
            .values()
            .find(|w| w.serves_host(host, root_domain))
            .cloned()
    }

    // ---- lifecycle ----

    /// Write the snapshot to the data file, if one is configured. The file
    /// is replaced atomically or not at all.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().unwrap_or_else(|e| e.into_inner());
        let bytes = serde_json::to_vec_pretty(&*self.read())?;
        let tmp = path.with_extension("tmp");
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&tmp, &bytes)?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Storage(format!("replacing {}: {}", path.display(), err)));
        }
        log::debug!("flushed store to {}", path.display());
        Ok(())
    }

    /// Flush, then empty the store.
    pub fn teardown(&self) -> Result<()> {
        self.flush()?;
        let mut inner = self.write();
        inner.pages.clear();
        inner.websites.clear();
        log::info!("page store torn down");
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.read().pages.len()
    }
}

impl PageSink for PageStore {
    fn save_canvas(&self, page_id: &str, canvas: &Canvas) -> Result<()> {
        self.replace_canvas(page_id, canvas.clone()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_element;
    use crate::model::ElementType;

    fn page(title: &str) -> NewPage {
        NewPage { title: Some(title.into()), ..Default::default() }
    }

    #[test]
    fn create_requires_title_and_slugs_path() {
        let store = PageStore::new();
        let err = store.create_page(NewPage::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if !e.messages("title").is_empty()));

        let p = store.create_page(page("About Us")).unwrap();
        assert_eq!(p.path, "/about-us");
        assert!(!p.is_published);
        assert!(matches!(store.create_page(page("About us")), Err(Error::Conflict(_))));
    }

    #[test]
    fn update_replaces_canvas_wholesale() {
        let store = PageStore::new();
        let p = store.create_page(page("Home")).unwrap();
        let mut canvas = Canvas::default();
        canvas.push(create_element(ElementType::Text, "t", 0.0, 0.0)).unwrap();
        canvas.selected_element_ids.insert("t".into());
        let saved = store.replace_canvas(&p.id, canvas).unwrap();
        assert_eq!(saved.content.len(), 1);
        assert!(saved.content.selected_element_ids.is_empty());
        assert!(saved.updated_at >= p.updated_at);

        let saved = store.replace_canvas(&p.id, Canvas::default()).unwrap();
        assert!(saved.content.is_empty());
        assert!(matches!(store.replace_canvas("nope", Canvas::default()), Err(Error::NotFound { .. })));
    }

    #[test]
    fn only_published_pages_resolve() {
        let store = PageStore::new();
        let p = store.create_page(NewPage { path: Some("pricing".into()), ..page("Pricing") }).unwrap();
        assert!(store.resolve_path(None, "/pricing").is_none());
        store.set_page_published(&p.id, true).unwrap();
        assert_eq!(store.resolve_path(None, "pricing/").unwrap().id, p.id);
    }

    #[test]
    fn path_lookup_is_scoped_to_one_website() {
        let store = PageStore::new();
        let mut pages = Vec::new();
        for sub in ["alpha", "beta"] {
            let site = store
                .create_website(NewWebsite { subdomain: sub.into(), ..Default::default() })
                .unwrap();
            let p = store
                .create_page(NewPage {
                    path: Some("/about".into()),
                    website_id: Some(site.id.clone()),
                    ..page("About")
                })
                .unwrap();
            store.set_page_published(&p.id, true).unwrap();
            pages.push((site.id, p.id));
        }

        // site pages never answer the site-less lookup
        assert!(store.resolve_path(None, "/about").is_none());
        // nor a lookup on an unpublished website
        assert!(store.resolve_path(Some(&pages[1].0), "/about").is_none());

        for (site, page) in &pages {
            store.set_website_published(site, true).unwrap();
            assert_eq!(store.resolve_path(Some(site), "/about").unwrap().id, *page);
        }
    }

    #[test]
    fn websites_are_unique_and_cascade() {
        let store = PageStore::new();
        let site = store
            .create_website(NewWebsite { subdomain: "My-Site1".into(), ..Default::default() })
            .unwrap();
        assert_eq!(site.subdomain, "my-site1");
        assert!(matches!(
            store.create_website(NewWebsite { subdomain: "my-site1".into(), ..Default::default() }),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            store.create_website(NewWebsite { subdomain: "ab".into(), ..Default::default() }),
            Err(Error::Validation(_))
        ));

        let home = store
            .create_page(NewPage { website_id: Some(site.id.clone()), ..page("Home") })
            .unwrap();
        store.create_page(page("Orphan")).unwrap();
        assert_eq!(store.website_pages(&site.id).unwrap()[0].id, home.id);
        assert_eq!(store.website_by_subdomain("MY-SITE1").unwrap().id, site.id);

        store.delete_website(&site.id).unwrap();
        assert!(store.get_page(&home.id).is_none());
        assert_eq!(store.page_count(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");
        let store = PageStore::open(&file).unwrap();
        let p = store.create_page(page("Home")).unwrap();
        store.teardown().unwrap();
        assert!(store.get_page(&p.id).is_none());

        let reopened = PageStore::open(&file).unwrap();
        assert_eq!(reopened.get_page(&p.id).unwrap().title, "Home");
        assert!(!dir.path().join("store.tmp").exists());
    }

    #[test]
    fn store_is_a_page_sink() {
        let store = PageStore::new();
        let p = store.create_page(page("Home")).unwrap();
        let sink: &dyn PageSink = &store;
        sink.save_canvas(&p.id, &Canvas::new(800.0, 600.0)).unwrap();
        assert_eq!(store.get_page(&p.id).unwrap().content.width, 800.0);
    }
}
