//! Closed icon table for button icons.
//!
//! Persisted canvases name icons by string. Only the names below render;
//! anything else means "no icon".

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    ArrowRight,
    ArrowLeft,
    Check,
    ChevronDown,
    Download,
    ExternalLink,
    Heart,
    Mail,
    Phone,
    Plus,
    Search,
    ShoppingCart,
    Star,
    User,
}

impl Icon {
    pub const ALL: [Icon; 14] = [
        Icon::ArrowRight,
        Icon::ArrowLeft,
        Icon::Check,
        Icon::ChevronDown,
        Icon::Download,
        Icon::ExternalLink,
        Icon::Heart,
        Icon::Mail,
        Icon::Phone,
        Icon::Plus,
        Icon::Search,
        Icon::ShoppingCart,
        Icon::Star,
        Icon::User,
    ];

    /// Canonical kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Icon::ArrowRight => "arrow-right",
            Icon::ArrowLeft => "arrow-left",
            Icon::Check => "check",
            Icon::ChevronDown => "chevron-down",
            Icon::Download => "download",
            Icon::ExternalLink => "external-link",
            Icon::Heart => "heart",
            Icon::Mail => "mail",
            Icon::Phone => "phone",
            Icon::Plus => "plus",
            Icon::Search => "search",
            Icon::ShoppingCart => "shopping-cart",
            Icon::Star => "star",
            Icon::User => "user",
        }
    }

    /// Text glyph drawn in place of the vector icon.
    pub fn glyph(&self) -> char {
        match self {
            Icon::ArrowRight => '→',
            Icon::ArrowLeft => '←',
            Icon::Check => '✓',
            Icon::ChevronDown => '⌄',
            Icon::Download => '⤓',
            Icon::ExternalLink => '↗',
            Icon::Heart => '♥',
            Icon::Mail => '✉',
            Icon::Phone => '☎',
            Icon::Plus => '+',
            Icon::Search => '⌕',
            Icon::ShoppingCart => '🛒',
            Icon::Star => '★',
            Icon::User => '👤',
        }
    }

    /// Look up a stored name. Accepts `arrow-right`, `ArrowRight` and
    /// `arrowRight`; unknown names yield `None`.
    pub fn from_name(raw: &str) -> Option<Icon> {
        let normalized = to_kebab(raw.trim());
        Icon::ALL.into_iter().find(|icon| icon.name() == normalized)
    }
}

impl Serialize for Icon {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

fn to_kebab(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for (i, ch) in raw.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' || ch == ' ' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}
