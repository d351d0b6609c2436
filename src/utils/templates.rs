#![forbid(unsafe_code)]

use std::path::Path;

use log::info;
use tera::{Context, Tera};

use crate::utils::errors::Errors;
use crate::utils::wiki_types::{Archive, Page, PageView};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Built-in templates compiled into the binary.
const VIEW_HTML : &str = include_str!("../../templates/view.html");
const EDIT_HTML : &str = include_str!("../../templates/edit.html");
const HOME_HTML : &str = include_str!("../../templates/home.html");

// ***************************************************************************
//                              Template Names
// ***************************************************************************
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiTemplate {View, Edit, Home}

impl WikiTemplate {
    pub fn file_name(&self) -> &'static str {
        match self {
            WikiTemplate::View => "view.html",
            WikiTemplate::Edit => "edit.html",
            WikiTemplate::Home => "home.html",
        }
    }
}

// ***************************************************************************
//                               Templates
// ***************************************************************************
/** The parsed template set.  It is built once at startup and only read
 * afterwards, so it is shared between requests without locking.
 */
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    // -----------------------------------------------------------------------
    // builtin:
    // -----------------------------------------------------------------------
    pub fn builtin() -> Result<Self, Errors> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (WikiTemplate::View.file_name(), VIEW_HTML),
            (WikiTemplate::Edit.file_name(), EDIT_HTML),
            (WikiTemplate::Home.file_name(), HOME_HTML),
        ])?;
        Ok(Self {tera})
    }

    // -----------------------------------------------------------------------
    // load:
    // -----------------------------------------------------------------------
    /** Parse the *.html templates found in dir, falling back to the built-in
     * template for each name the directory does not provide.  A missing
     * directory yields the built-in set.
     */
    pub fn load(dir: &Path) -> Result<Self, Errors> {
        let builtin = Self::builtin()?;
        if !dir.is_dir() {
            return Ok(builtin);
        }

        let pattern = format!("{}/*.html", dir.to_string_lossy());
        let mut tera = Tera::new(&pattern)?;
        tera.extend(&builtin.tera)?;
        info!("Templates loaded from {:?}: {:?}", dir,
              tera.get_template_names().collect::<Vec<_>>());
        Ok(Self {tera})
    }

    // -----------------------------------------------------------------------
    // render_page:
    // -----------------------------------------------------------------------
    pub fn render_page(&self, template: WikiTemplate, page: &Page, site_title: &str)
    -> Result<String, Errors> {
        let mut ctx = Context::new();
        ctx.insert("page", &PageView::from(page));
        ctx.insert("site_title", site_title);
        Ok(self.tera.render(template.file_name(), &ctx)?)
    }

    // -----------------------------------------------------------------------
    // render_home:
    // -----------------------------------------------------------------------
    pub fn render_home(&self, archive: &Archive, site_title: &str) -> Result<String, Errors> {
        let mut ctx = Context::new();
        ctx.insert("archive", archive);
        ctx.insert("site_title", site_title);
        Ok(self.tera.render(WikiTemplate::Home.file_name(), &ctx)?)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::wiki_types::ArchiveEntry;
    use std::fs;

    #[test]
    fn view_escapes_body() {
        let t = Templates::builtin().unwrap();
        let page = Page::new("xss".to_string(), b"<script>alert(1)</script>".to_vec())
            .with_route("xss".to_string());
        let html = t.render_page(WikiTemplate::View, &page, "Wiki").unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<h1>Xss</h1>"));
    }

    #[test]
    fn edit_posts_to_route() {
        let t = Templates::builtin().unwrap();
        let page = Page::empty("my page".to_string()).with_route("my-page".to_string());
        let html = t.render_page(WikiTemplate::Edit, &page, "Wiki").unwrap();
        assert!(html.contains(r#"action="/save/my-page""#));
        assert!(html.contains("Editing My Page"));
    }

    #[test]
    fn home_lists_entries_and_overflow() {
        let t = Templates::builtin().unwrap();
        let wikis = vec![ArchiveEntry {title: "Alpha".to_string(), route: "alpha".to_string()}];
        let html = t.render_home(&Archive::new(wikis, 3), "My Wiki").unwrap();
        assert!(html.contains(r#"<a href="/view/alpha">Alpha</a>"#));
        assert!(html.contains("Showing 1 of 3 pages."));

        let html = t.render_home(&Archive::new(vec!(), 0), "My Wiki").unwrap();
        assert!(html.contains("No pages yet."));
    }

    #[test]
    fn directory_templates_override_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("view.html"), "custom {{ page.title }}").unwrap();

        let t = Templates::load(dir.path()).unwrap();
        let page = Page::new("abc".to_string(), vec!()).with_route("abc".to_string());
        assert_eq!(t.render_page(WikiTemplate::View, &page, "W").unwrap(), "custom Abc");
        // Names the directory lacks still come from the built-in set.
        assert!(t.render_page(WikiTemplate::Edit, &page, "W").unwrap().contains("/save/abc"));
    }

    #[test]
    fn missing_directory_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let t = Templates::load(&dir.path().join("none")).unwrap();
        let page = Page::empty("abc".to_string()).with_route("abc".to_string());
        assert!(t.render_page(WikiTemplate::View, &page, "W").is_ok());
    }
}
