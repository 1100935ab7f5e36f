//! Page host: decides what the render surface shows.
//!
//! The host owns the active page name and the zoom factor. Navigation from
//! inside a page arrives as a URL; the trailing path segment names the page
//! to load from the catalog. A direct load of an unknown name renders
//! [`NOT_FOUND_HTML`] and leaves the active page unchanged.

use std::path::Path;

use schoolhouse_core::config::ShellConfig;
use url::Url;

use crate::error::ShellError;
use crate::pages::{PageCatalog, NOT_FOUND_HTML};

/// Where page HTML ends up. Implemented by the webview in [`crate::window`].
pub trait RenderSurface {
    /// Replace the displayed document. Relative links resolve against
    /// `base_url` when one is given.
    fn set_html(&mut self, html: &str, base_url: Option<&str>) -> Result<(), ShellError>;

    /// Set the magnification of the displayed document.
    fn set_zoom(&mut self, factor: f64) -> Result<(), ShellError>;
}

/// Result of a page load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    Loaded(String),
    NotFound(String),
    /// The surface refused the document. The active page is unchanged.
    RenderFailed(String),
}

pub struct PageHost<S> {
    catalog: PageCatalog,
    surface: S,
    base_url: Option<String>,
    zoom_factor: f64,
    active: Option<String>,
}

impl<S: RenderSurface> PageHost<S> {
    /// Create a host and apply the zoom factor to the surface.
    pub fn new(
        catalog: PageCatalog,
        mut surface: S,
        base_url: Option<String>,
        zoom_factor: f64,
    ) -> Self {
        if let Err(e) = surface.set_zoom(zoom_factor) {
            tracing::warn!(error = %e, "Failed to set initial zoom");
        }
        Self {
            catalog,
            surface,
            base_url,
            zoom_factor,
            active: None,
        }
    }

    pub fn from_config(config: &ShellConfig, catalog: PageCatalog, surface: S) -> Self {
        let base_url = base_url_for(Path::new(&config.base_dir));
        if base_url.is_none() {
            tracing::warn!(base_dir = %config.base_dir, "Base directory is not usable, relative resources will not resolve");
        }
        Self::new(catalog, surface, base_url, config.zoom_factor)
    }

    /// Show the named page, or the not-found page if the catalog lacks it.
    /// Failures are logged and reported in the result, never returned as
    /// errors.
    pub fn load_page(&mut self, name: &str) -> PageLoad {
        let Some(html) = self.catalog.get(name) else {
            let err = ShellError::UnknownPageRequested(name.to_string());
            tracing::warn!(error = %err, "Showing not-found page");
            if let Err(e) = self.surface.set_html(NOT_FOUND_HTML, None) {
                tracing::warn!(error = %e, "Failed to show not-found page");
            }
            return PageLoad::NotFound(name.to_string());
        };

        match self.surface.set_html(html, self.base_url.as_deref()) {
            Ok(()) => {
                self.active = Some(name.to_string());
                tracing::info!(page = name, "Page loaded");
                PageLoad::Loaded(name.to_string())
            }
            Err(e) => {
                tracing::warn!(page = name, error = %e, "Failed to load page");
                PageLoad::RenderFailed(name.to_string())
            }
        }
    }

    /// Handle a navigation request from inside a page. Only URLs whose last
    /// segment names a catalog page are acted on; anything else returns
    /// `None` and leaves the surface untouched.
    pub fn on_navigated(&mut self, url: &str) -> Option<PageLoad> {
        match page_name_from_url(url) {
            Some(name) if self.catalog.contains(&name) => {
                tracing::debug!(url, page = %name, "Navigation requested");
                Some(self.load_page(&name))
            }
            _ => {
                tracing::debug!(url, "Navigation to a non-catalog page ignored");
                None
            }
        }
    }

    /// A document finished loading. Content loads can reset magnification,
    /// so the zoom factor is applied again.
    pub fn on_page_ready(&mut self) -> Result<(), ShellError> {
        self.surface.set_zoom(self.zoom_factor)
    }

    pub fn active_page(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn catalog(&self) -> &PageCatalog {
        &self.catalog
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// The last path segment of a navigation URL, e.g. `Student.html` for
/// `file:///opt/school/Student.html?tab=1`. Strings that are not absolute
/// URLs are treated as plain paths.
pub fn page_name_from_url(raw: &str) -> Option<String> {
    let name = match Url::parse(raw) {
        Ok(url) => url.path_segments()?.next_back()?.to_string(),
        Err(_) => {
            let path = raw.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().unwrap_or_default().to_string()
        }
    };
    (!name.is_empty()).then_some(name)
}

/// `file://` URL for a directory, with a trailing slash so relative links
/// resolve inside it.
pub fn base_url_for(dir: &Path) -> Option<String> {
    let absolute = std::path::absolute(dir).ok()?;
    Url::from_directory_path(&absolute).ok().map(String::from)
}

/// Insert a `<base>` element so relative links in `html` resolve against
/// `base_url`. Documents without a `<head>` get it prepended.
pub fn inject_base_href(html: &str, base_url: &str) -> String {
    let base = format!("<base href=\"{}\">", base_url);
    match html.to_ascii_lowercase().find("<head>") {
        Some(idx) => {
            let at = idx + "<head>".len();
            let mut out = String::with_capacity(html.len() + base.len());
            out.push_str(&html[..at]);
            out.push_str(&base);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{}{}", base, html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        documents: Vec<(String, Option<String>)>,
        zooms: Vec<f64>,
        fail_html: bool,
    }

    impl RenderSurface for RecordingSurface {
        fn set_html(&mut self, html: &str, base_url: Option<&str>) -> Result<(), ShellError> {
            if self.fail_html {
                return Err(ShellError::Surface("closed".to_string()));
            }
            self.documents
                .push((html.to_string(), base_url.map(str::to_string)));
            Ok(())
        }

        fn set_zoom(&mut self, factor: f64) -> Result<(), ShellError> {
            self.zooms.push(factor);
            Ok(())
        }
    }

    fn host() -> PageHost<RecordingSurface> {
        PageHost::new(
            PageCatalog::embedded(),
            RecordingSurface::default(),
            Some("file:///opt/school/".to_string()),
            1.35,
        )
    }

    fn last_html(host: &PageHost<RecordingSurface>) -> &str {
        &host.surface().documents.last().unwrap().0
    }

    #[test]
    fn new_applies_zoom() {
        let host = host();
        assert_eq!(host.surface().zooms, vec![1.35]);
        assert!(host.active_page().is_none());
    }

    #[test]
    fn load_known_page() {
        let mut host = host();
        let load = host.load_page("Dashboard.html");

        assert_eq!(load, PageLoad::Loaded("Dashboard.html".to_string()));
        assert_eq!(host.active_page(), Some("Dashboard.html"));
        assert_eq!(last_html(&host), crate::pages::DASHBOARD_HTML);
        assert_eq!(
            host.surface().documents[0].1.as_deref(),
            Some("file:///opt/school/")
        );
    }

    #[test]
    fn navigation_switches_page() {
        let mut host = host();
        host.load_page("Dashboard.html");

        let load = host.on_navigated(".../Student.html");

        assert_eq!(load, Some(PageLoad::Loaded("Student.html".to_string())));
        assert_eq!(host.active_page(), Some("Student.html"));
        assert_eq!(last_html(&host), crate::pages::STUDENT_HTML);
    }

    #[test]
    fn navigation_by_file_url() {
        let mut host = host();
        host.on_navigated("file:///opt/school/Teacher.html?from=dashboard#top");
        assert_eq!(host.active_page(), Some("Teacher.html"));
    }

    #[test]
    fn unknown_page_shows_error_and_keeps_active() {
        let mut host = host();
        host.load_page("Dashboard.html");

        let load = host.load_page("missing.html");

        assert_eq!(load, PageLoad::NotFound("missing.html".to_string()));
        assert_eq!(last_html(&host), "<h1>Error: Page not found</h1>");
        assert_eq!(host.surface().documents.last().unwrap().1, None);
        assert_eq!(host.active_page(), Some("Dashboard.html"));
    }

    #[test]
    fn navigation_to_unknown_page_is_ignored() {
        let mut host = host();
        host.load_page("Dashboard.html");

        assert_eq!(host.on_navigated("file:///opt/school/missing.html"), None);
        assert_eq!(host.on_navigated("about:blank"), None);
        assert_eq!(host.on_navigated("file:///opt/school/"), None);
        assert_eq!(host.surface().documents.len(), 1);
        assert_eq!(host.active_page(), Some("Dashboard.html"));
    }

    #[test]
    fn page_ready_reapplies_zoom() {
        let mut host = host();
        host.load_page("Dashboard.html");
        host.on_page_ready().unwrap();
        host.on_navigated("Student.html");
        host.on_page_ready().unwrap();

        assert_eq!(host.surface().zooms, vec![1.35, 1.35, 1.35]);
        assert_eq!(host.zoom_factor(), 1.35);
    }

    #[test]
    fn surface_failure_leaves_active_page() {
        let mut host = host();
        host.load_page("Dashboard.html");
        host.surface.fail_html = true;

        assert_eq!(
            host.load_page("Student.html"),
            PageLoad::RenderFailed("Student.html".to_string())
        );
        assert_eq!(host.active_page(), Some("Dashboard.html"));
    }

    #[test]
    fn from_config_uses_zoom_and_base_dir() {
        let dir = std::env::temp_dir();
        let config = ShellConfig {
            zoom_factor: 2.0,
            base_dir: dir.to_string_lossy().to_string(),
            ..ShellConfig::default()
        };
        let host = PageHost::from_config(&config, PageCatalog::embedded(), RecordingSurface::default());

        assert_eq!(host.surface().zooms, vec![2.0]);
        let base = host.base_url().unwrap();
        assert!(base.starts_with("file://"));
        assert!(base.ends_with('/'));
    }

    #[test]
    fn page_name_extraction() {
        assert_eq!(
            page_name_from_url("file:///C:/school/Student.html").as_deref(),
            Some("Student.html")
        );
        assert_eq!(
            page_name_from_url("https://school.local/app/Teacher.html?x=1").as_deref(),
            Some("Teacher.html")
        );
        assert_eq!(page_name_from_url("Dashboard.html").as_deref(), Some("Dashboard.html"));
        assert_eq!(page_name_from_url("pages/Fees.html#top").as_deref(), Some("Fees.html"));
        assert_eq!(page_name_from_url("data:text/html,<p>hi</p>"), None);
        assert_eq!(page_name_from_url(""), None);
    }

    #[test]
    fn base_href_goes_into_head() {
        let html = "<!DOCTYPE html><html><head><title>x</title></head></html>";
        let out = inject_base_href(html, "file:///opt/school/");
        assert_eq!(
            out,
            "<!DOCTYPE html><html><head><base href=\"file:///opt/school/\"><title>x</title></head></html>"
        );
    }

    #[test]
    fn base_href_without_head_is_prepended() {
        let out = inject_base_href("<h1>hi</h1>", "file:///tmp/");
        assert_eq!(out, "<base href=\"file:///tmp/\"><h1>hi</h1>");
    }
}
