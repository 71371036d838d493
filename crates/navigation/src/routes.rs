//! Route declaration table: ordered sections of pages, each page optionally
//! gated by a single permission slug.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use medgate_auth::{KnownSlug, PermissionCatalog, PermissionSlug};

use crate::error::NavigationError;

/// Which part of the application a section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// The authenticated operator console.
    #[default]
    App,
    /// Sign-in / sign-up screens, only traversed while signed out.
    PreAuth,
}

/// A navigable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePage {
    pub path: String,
    pub name: String,
    /// `None`: visible to every authenticated identity.
    #[serde(default)]
    pub required_permission: Option<PermissionSlug>,
}

impl RoutePage {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            required_permission: None,
        }
    }

    pub fn requires(mut self, slug: KnownSlug) -> Self {
        self.required_permission = Some(slug.slug());
        self
    }
}

/// A navigation section (menu group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSection {
    /// Menu header; untitled sections render their pages without one.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    pub pages: Vec<RoutePage>,
}

impl RouteSection {
    pub fn app(title: impl Into<String>, pages: Vec<RoutePage>) -> Self {
        Self {
            title: Some(title.into()),
            layout: Layout::App,
            pages,
        }
    }

    pub fn pre_auth(pages: Vec<RoutePage>) -> Self {
        Self {
            title: None,
            layout: Layout::PreAuth,
            pages,
        }
    }

    pub fn is_pre_auth(&self) -> bool {
        self.layout == Layout::PreAuth
    }
}

/// The ordered route declaration table.
///
/// Order is significant: it is the menu order and the landing-page tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default = "default_version")]
    pub version: u32,
    pub sections: Vec<RouteSection>,
}

fn default_version() -> u32 {
    1
}

impl RouteTable {
    pub fn new(sections: Vec<RouteSection>) -> Self {
        Self {
            version: default_version(),
            sections,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, NavigationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavigationError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn sections(&self) -> &[RouteSection] {
        &self.sections
    }

    /// First declaration of `path`, with its section.
    pub fn find_page(&self, path: &str) -> Option<(&RouteSection, &RoutePage)> {
        self.sections
            .iter()
            .flat_map(|s| s.pages.iter().map(move |p| (s, p)))
            .find(|(_, p)| p.path == path)
    }

    pub fn is_pre_auth_path(&self, path: &str) -> bool {
        self.find_page(path).is_some_and(|(s, _)| s.is_pre_auth())
    }

    /// First page of the first pre-authentication section (the sign-in screen).
    pub fn sign_in_path(&self) -> Option<&str> {
        self.sections
            .iter()
            .filter(|s| s.is_pre_auth())
            .flat_map(|s| s.pages.iter())
            .map(|p| p.path.as_str())
            .next()
    }

    /// Check every required slug against a loaded catalog.
    pub fn validate_against(&self, catalog: &PermissionCatalog) -> Result<(), NavigationError> {
        self.validate_with(|slug| catalog.contains_slug(slug))
    }

    /// Check every required slug against the application's known slugs.
    pub fn validate_known(&self) -> Result<(), NavigationError> {
        self.validate_with(|slug| slug.parse::<KnownSlug>().is_ok())
    }

    fn validate_with(&self, known: impl Fn(&str) -> bool) -> Result<(), NavigationError> {
        for section in &self.sections {
            let mut paths = HashSet::new();
            for page in &section.pages {
                if page.path.trim().is_empty() {
                    return Err(NavigationError::EmptyPath {
                        name: page.name.clone(),
                    });
                }
                if !paths.insert(page.path.as_str()) {
                    return Err(NavigationError::DuplicatePath {
                        path: page.path.clone(),
                    });
                }
                if let Some(slug) = &page.required_permission {
                    if !known(slug.as_str()) {
                        return Err(NavigationError::UnknownPermission {
                            path: page.path.clone(),
                            slug: slug.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_tables_with_defaults() {
        let table = RouteTable::from_json(
            r#"{
                "sections": [
                    { "layout": "pre_auth", "pages": [ { "path": "/sign-in", "name": "Sign in" } ] },
                    { "title": "Main", "pages": [
                        { "path": "/home", "name": "Home" },
                        { "path": "/billing", "name": "Billing", "required_permission": "manage-billing" }
                    ] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(table.version, 1);
        assert_eq!(table.sections[1].layout, Layout::App);
        assert_eq!(table.sign_in_path(), Some("/sign-in"));
        assert!(table.is_pre_auth_path("/sign-in"));
        assert!(!table.is_pre_auth_path("/home"));
        assert_eq!(
            table.find_page("/billing").unwrap().1.required_permission,
            Some(PermissionSlug::new("manage-billing"))
        );
        table.validate_known().unwrap();
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(RouteTable::from_json("{"), Err(NavigationError::Parse(_))));
    }

    #[test]
    fn unknown_slugs_fail_validation() {
        let mut page = RoutePage::new("/billing", "Billing");
        page.required_permission = Some(PermissionSlug::new("manage-biling"));
        let table = RouteTable::new(vec![RouteSection::app("Main", vec![page])]);

        match table.validate_known() {
            Err(NavigationError::UnknownPermission { path, slug }) => {
                assert_eq!(path, "/billing");
                assert_eq!(slug, "manage-biling");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_paths_within_a_section_fail_validation() {
        let table = RouteTable::new(vec![RouteSection::app(
            "Main",
            vec![RoutePage::new("/home", "Home"), RoutePage::new("/home", "Home again")],
        )]);
        assert!(matches!(table.validate_known(), Err(NavigationError::DuplicatePath { .. })));
    }
}
