use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medgate_core::{DomainError, DomainResult, Entity, PermissionId, ValueObject};

/// Permission slug: the stable identifier used by route declarations and
/// identity permission sets (e.g. "view-patients").
///
/// Slugs are opaque at this layer. An unknown slug is never an error at
/// runtime; it simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSlug(Cow<'static, str>);

impl PermissionSlug {
    /// Wrap a slug without validation (trusted/static input).
    pub fn new(slug: impl Into<Cow<'static, str>>) -> Self {
        Self(slug.into())
    }

    /// Parse a slug supplied by a caller.
    ///
    /// Accepts lowercase ASCII alphanumerics plus `-`, `.`, `_` and `:`; must
    /// start and end with an alphanumeric.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let slug = raw.trim();
        let valid_char =
            |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_' | ':');
        let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

        if slug.is_empty() {
            return Err(DomainError::validation("permission slug cannot be empty"));
        }
        if !slug.chars().all(valid_char) || !alnum(slug.chars().next()) || !alnum(slug.chars().last()) {
            return Err(DomainError::validation(format!("invalid permission slug '{slug}'")));
        }
        Ok(Self(Cow::Owned(slug.to_string())))
    }

    /// Derive a slug from a display name ("Manage Billing" -> "manage-billing").
    ///
    /// Every run of non-alphanumeric characters becomes a single `-`.
    pub fn from_name(name: &str) -> DomainResult<Self> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if slug.is_empty() {
            return Err(DomainError::validation(format!(
                "cannot derive a permission slug from '{name}'"
            )));
        }
        Ok(Self(Cow::Owned(slug)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for PermissionSlug {}

impl core::fmt::Display for PermissionSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::borrow::Borrow<str> for PermissionSlug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Grouping label of a permission.
///
/// Absent, empty and whitespace-only labels are the same key: [`ModuleName::GENERAL`].
/// Labels compare, hash and order ASCII case-insensitively; the stored
/// spelling is only used for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub struct ModuleName(String);

impl ModuleName {
    pub const GENERAL: &'static str = "General";

    pub fn new(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(label) if !label.is_empty() => Self(label.to_string()),
            _ => Self::general(),
        }
    }

    pub fn general() -> Self {
        Self(Self::GENERAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_general(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::GENERAL)
    }

    /// Whether a raw filter label names this module.
    pub fn matches(&self, label: &str) -> bool {
        *self == Self::new(Some(label))
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for ModuleName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ModuleName {}

impl core::hash::Hash for ModuleName {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        for b in self.folded() {
            state.write_u8(b);
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for ModuleName {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleName {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.folded().cmp(other.folded())
    }
}

impl ValueObject for ModuleName {}

impl Default for ModuleName {
    fn default() -> Self {
        Self::general()
    }
}

impl From<Option<String>> for ModuleName {
    fn from(value: Option<String>) -> Self {
        Self::new(value.as_deref())
    }
}

impl From<&str> for ModuleName {
    fn from(value: &str) -> Self {
        Self::new(Some(value))
    }
}

impl From<ModuleName> for String {
    fn from(value: ModuleName) -> Self {
        value.0
    }
}

impl core::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A grantable capability as stored in the permission catalog.
///
/// Only the display fields (`name`, `description`) may change once a role
/// references the permission; the slug never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub slug: PermissionSlug,
    pub name: String,
    #[serde(default)]
    pub module: ModuleName,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Build a permission from its display name, deriving the slug.
    pub fn from_name(
        id: PermissionId,
        name: &str,
        module: Option<&str>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("permission name cannot be empty"));
        }

        Ok(Self {
            id,
            slug: PermissionSlug::from_name(name)?,
            name: name.to_string(),
            module: ModuleName::new(module),
            description: normalize_description(description),
            created_at: now,
            updated_at: now,
        })
    }
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Blank descriptions are stored as `None`.
pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
