//! Embedded page assets.
//!
//! Every page is a self-contained HTML document compiled in with
//! `include_str!`, so the binary needs no files next to it at runtime.
//! Pages link to each other by bare file name (`Student.html`), which is
//! also the key they are looked up by.

use std::collections::BTreeMap;

/// School overview with one counter card per section.
pub const DASHBOARD_HTML: &str = include_str!("../assets/Dashboard.html");

/// Student register.
pub const STUDENT_HTML: &str = include_str!("../assets/Student.html");

/// Teacher register.
pub const TEACHER_HTML: &str = include_str!("../assets/Teacher.html");

/// Shown in place of a page that is not in the catalog.
pub const NOT_FOUND_HTML: &str = "<h1>Error: Page not found</h1>";

/// Name-to-content lookup for the pages the shell can display.
#[derive(Debug, Clone)]
pub struct PageCatalog {
    pages: BTreeMap<String, &'static str>,
}

impl PageCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// The pages compiled into this binary.
    pub fn embedded() -> Self {
        let mut catalog = Self::new();
        catalog.insert("Dashboard.html", DASHBOARD_HTML);
        catalog.insert("Student.html", STUDENT_HTML);
        catalog.insert("Teacher.html", TEACHER_HTML);
        catalog
    }

    /// Add or replace a page.
    pub fn insert(&mut self, name: impl Into<String>, html: &'static str) {
        self.pages.insert(name.into(), html);
    }

    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.pages.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Page names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Default for PageCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}
