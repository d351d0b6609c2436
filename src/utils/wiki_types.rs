// This file contains the wiki page structs and related definitions.
#![forbid(unsafe_code)]

use serde::Serialize;

use crate::utils::title::display_title;

// ---------------------------------------------------------------------------
// Page:
// ---------------------------------------------------------------------------
/** A page as it exists for the duration of one request.  The title is the
 * canonical title, the body is stored without any encoding check and the
 * route keeps the hyphenated URL token for edit forms.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub body: Vec<u8>,
    pub route: Option<String>,
}

impl Page {
    pub fn new(title: String, body: Vec<u8>) -> Self {
        Self {title, body, route: None}
    }

    /// A page with only its title set.
    pub fn empty(title: String) -> Self {
        Self::new(title, vec!())
    }

    pub fn with_route(mut self, route: String) -> Self {
        self.route = Some(route);
        self
    }

    pub fn display_title(&self) -> String {
        display_title(&self.title)
    }
}

// ---------------------------------------------------------------------------
// LoadOutcome:
// ---------------------------------------------------------------------------
/** Absence of a page is an expected outcome, not an error. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Found(Page),
    Absent,
}

#[cfg(test)]
impl LoadOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, LoadOutcome::Found(_))
    }
}

// ---------------------------------------------------------------------------
// Archive:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub title: String,
    pub route: String,
}

/** The home page listing, rebuilt from the store on every request. */
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Archive {
    pub wikis: Vec<ArchiveEntry>,
    pub total: usize,
    pub has_more: bool,
}

impl Archive {
    pub fn new(wikis: Vec<ArchiveEntry>, total: usize) -> Self {
        let has_more = total > wikis.len();
        Self {wikis, total, has_more}
    }
}

// ---------------------------------------------------------------------------
// PageView:
// ---------------------------------------------------------------------------
/** Template facing form of a page.  The body is decoded lossily and the
 * template engine escapes it.
 */
#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: String,
    pub body: String,
    pub route: String,
}

impl From<&Page> for PageView {
    fn from(page: &Page) -> Self {
        Self {
            title: page.display_title(),
            body: String::from_utf8_lossy(&page.body).into_owned(),
            route: page.route.clone().unwrap_or_default(),
        }
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_view_uses_display_title() {
        let page = Page::new("my page".to_string(), b"hello".to_vec())
            .with_route("my-page".to_string());
        let view = PageView::from(&page);
        assert_eq!(view.title, "My Page");
        assert_eq!(view.body, "hello");
        assert_eq!(view.route, "my-page");
    }

    #[test]
    fn page_view_tolerates_invalid_utf8() {
        let page = Page::new("bin".to_string(), vec![0x66, 0xff, 0x6f]);
        assert_eq!(PageView::from(&page).body, "f\u{fffd}o");
    }

    #[test]
    fn archive_reports_more() {
        let e = ArchiveEntry {title: "A".to_string(), route: "a".to_string()};
        assert!(Archive::new(vec![e.clone()], 2).has_more);
        assert!(!Archive::new(vec![e], 1).has_more);
    }
}
