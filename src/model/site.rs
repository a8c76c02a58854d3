//! Pages and websites: the persisted owners of canvases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Canvas;

/// SEO and social preview fields for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// A page owns exactly one canvas. Saves replace `content` wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_id: Option<String>,
    pub title: String,
    /// Unique within the owning website, always starts with `/`.
    pub path: String,
    #[serde(default)]
    pub content: Canvas,
    #[serde(default)]
    pub metadata: PageMetadata,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tenant site addressed by subdomain or custom domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    /// Owned pages in site order.
    #[serde(default)]
    pub page_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Website {
    /// `true` when `host` (without port) addresses this site, either as
    /// `<subdomain>.<root_domain>` or as its custom domain.
    pub fn serves_host(&self, host: &str, root_domain: Option<&str>) -> bool {
        let host = host
            .split(':')
            .next()
            .unwrap_or(host)
            .trim_end_matches('.')
            .to_ascii_lowercase();
        if let Some(domain) = &self.domain {
            if host.eq_ignore_ascii_case(domain) {
                return true;
            }
        }
        match root_domain {
            Some(root) => {
                let root = root.trim().trim_end_matches('.').to_ascii_lowercase();
                host.strip_suffix(root.as_str())
                    .and_then(|rest| rest.strip_suffix('.'))
                    .is_some_and(|sub| sub.eq_ignore_ascii_case(&self.subdomain))
            }
            None => false,
        }
    }
}
