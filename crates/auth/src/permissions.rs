use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use grantgate_core::CoreError;

/// Permission identifier.
///
/// Keys are opaque, case-sensitive strings such as `"USER.VIEW"`. The
/// `CATEGORY.ACTION` shape is a convention used by display helpers; no key
/// carries special meaning during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Result<Self, CoreError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text before the first `.`, or the whole key when there is none.
    pub fn category_prefix(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Text after the last `.`, or the whole key when there is none.
    pub fn action(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

fn validate_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() {
        return Err(CoreError::validation("permission key is empty"));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':')))
    {
        return Err(CoreError::validation(format!(
            "permission key '{key}' contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for PermissionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0.into_owned()
    }
}

/// Display-only grouping of permissions (e.g. "USER", "COURSE").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Category implied by a key's `CATEGORY.` prefix.
    pub fn from_key(key: &PermissionKey) -> Self {
        Self(Cow::Owned(key.category_prefix().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission definition (for display and policy declaration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub key: PermissionKey,
    pub category: Category,
    pub description: Option<String>,
}

impl PermissionDefinition {
    pub fn new(key: PermissionKey) -> Self {
        let category = Category::from_key(&key);
        Self {
            key,
            category,
            description: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Every permission the host declares at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    entries: BTreeMap<PermissionKey, PermissionDefinition>,
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, definition: PermissionDefinition) -> Self {
        self.insert(definition);
        self
    }

    /// Insert or replace the definition for its key.
    pub fn insert(&mut self, definition: PermissionDefinition) {
        self.entries.insert(definition.key.clone(), definition);
    }

    pub fn get(&self, key: &PermissionKey) -> Option<&PermissionDefinition> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.entries.keys()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &PermissionDefinition> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group keys by display category. Keys missing from the catalog fall back
    /// to their `CATEGORY.` prefix.
    pub fn group_by_category<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a PermissionKey>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in keys {
            let category = match self.get(key) {
                Some(def) => def.category.as_str().to_string(),
                None => key.category_prefix().to_string(),
            };
            groups.entry(category).or_default().push(key.to_string());
        }
        for members in groups.values_mut() {
            members.sort();
        }
        groups
    }
}
