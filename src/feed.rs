//! Server-driven render feed: pages projected to what a remote renderer
//! consumes. Geometry and style/props arrive already resolved.

use serde::{Deserialize, Serialize};

use crate::flatten::{flatten, FlatElement};
use crate::geometry::Size;
use crate::model::{Page, PageMetadata, Website};
use crate::rendering::skeleton_digest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: String,
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub metadata: PageMetadata,
}

/// `GET /render/{id}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFeed {
    pub page: PageSummary,
    pub canvas: Size,
    pub elements: Vec<FlatElement>,
}

impl PageFeed {
    pub fn from_page(page: &Page) -> Self {
        Self {
            page: PageSummary {
                id: page.id.clone(),
                title: page.title.clone(),
                path: page.path.clone(),
                metadata: page.metadata.clone(),
            },
            canvas: Size::new(page.content.width, page.content.height),
            elements: flatten(&page.content),
        }
    }

    /// Skeleton digest, used as the HTTP `ETag`.
    pub fn etag(&self) -> String {
        skeleton_digest(self.canvas, &self.elements)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSummary {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// `GET /render/website/{id}` body: every page, pre-flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteFeed {
    pub website: WebsiteSummary,
    pub pages: Vec<PageFeed>,
}

impl WebsiteFeed {
    pub fn new(website: &Website, pages: &[Page]) -> Self {
        Self {
            website: WebsiteSummary {
                id: website.id.clone(),
                name: website.name.clone(),
                subdomain: website.subdomain.clone(),
                domain: website.domain.clone(),
            },
            pages: pages.iter().map(PageFeed::from_page).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_element;
    use crate::model::{Canvas, ElementType};
    use chrono::Utc;

    fn sample_page() -> Page {
        let mut content = Canvas::default();
        content.push(create_element(ElementType::Button, "cta", 10.0, 20.0)).unwrap();
        Page {
            id: "p1".into(),
            website_id: None,
            title: "Home".into(),
            path: "/".into(),
            content,
            metadata: PageMetadata::default(),
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn feed_carries_resolved_geometry() {
        let feed = PageFeed::from_page(&sample_page());
        assert_eq!(feed.canvas, Size::new(1200.0, 800.0));
        assert_eq!(feed.elements[0].width, 152.0);
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["page"]["path"], "/");
        assert_eq!(json["elements"][0]["type"], "button");
        assert_eq!(json["elements"][0]["props"]["text"], "버튼");
    }

    #[test]
    fn etag_tracks_content() {
        let mut page = sample_page();
        let before = PageFeed::from_page(&page).etag();
        assert_eq!(before, PageFeed::from_page(&page).etag());
        page.content.get_mut("cta").unwrap().x = 11.0;
        assert_ne!(before, PageFeed::from_page(&page).etag());
    }
}
