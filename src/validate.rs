//! Field validation for websites and pages.
//!
//! Validators collect every problem into [`ValidationErrors`] instead of
//! stopping at the first one.

use crate::error::ValidationErrors;
use crate::Result;

pub const SUBDOMAIN_MIN_LEN: usize = 3;
pub const SUBDOMAIN_MAX_LEN: usize = 63;
pub const TITLE_MAX_LEN: usize = 200;

fn check_label(label: &str, field: &str, errors: &mut ValidationErrors) {
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        errors.add(field, "only letters, digits and hyphens are allowed");
    }
    if label.starts_with('-') || label.ends_with('-') {
        errors.add(field, "must start and end with a letter or digit");
    }
}

/// `[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]`, 3 to 63 characters.
pub fn validate_subdomain(name: &str) -> Result<()> {
    let mut errors = ValidationErrors::new();
    let len = name.chars().count();
    if len < SUBDOMAIN_MIN_LEN {
        errors.add("subdomain", format!("must be at least {} characters", SUBDOMAIN_MIN_LEN));
    } else if len > SUBDOMAIN_MAX_LEN {
        errors.add("subdomain", format!("must be at most {} characters", SUBDOMAIN_MAX_LEN));
    }
    if !name.is_empty() {
        check_label(name, "subdomain", &mut errors);
    }
    errors.into_result()
}

/// Custom domain: two or more dot-separated labels, each a valid host label.
pub fn validate_domain(domain: &str) -> Result<()> {
    let mut errors = ValidationErrors::new();
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        errors.add("domain", "must contain at least one dot");
    }
    for label in labels {
        if label.is_empty() || label.len() > SUBDOMAIN_MAX_LEN {
            errors.add("domain", "each label must be 1 to 63 characters");
        } else {
            check_label(label, "domain", &mut errors);
        }
    }
    errors.into_result()
}

/// URL-safe path segment derived from a title. Letters (any script) and
/// digits survive; runs of anything else become a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("page");
    }
    slug
}

/// Canonical page path: leading slash, no empty, `.` or `..` segments,
/// no trailing slash except for the root.
pub fn normalize_path(raw: &str) -> Result<String> {
    let mut errors = ValidationErrors::new();
    let mut segments = Vec::new();
    for segment in raw.trim().split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            errors.add("path", "relative segments are not allowed");
        } else if segment.chars().any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '\\')) {
            errors.add("path", format!("invalid segment '{}'", segment));
        } else {
            segments.push(segment);
        }
    }
    errors.into_result()?;
    Ok(format!("/{}", segments.join("/")))
}

/// Title is required for new pages and must not be blank.
pub fn validate_title(title: Option<&str>, errors: &mut ValidationErrors) {
    match title.map(str::trim) {
        None => errors.add("title", "is required"),
        Some("") => errors.add("title", "must not be blank"),
        Some(t) if t.chars().count() > TITLE_MAX_LEN => {
            errors.add("title", format!("must be at most {} characters", TITLE_MAX_LEN))
        }
        Some(_) => {}
    }
}
