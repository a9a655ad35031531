//! Widget configuration.
//!
//! Every class name, key prefix and icon path the tree reads or writes lives
//! here, so a host can adapt the widget to markup produced by another report
//! stylesheet without touching the tree code.

use super::*;
use serde::{Deserialize, Serialize};

/// Class names, relational key prefixes and icon paths used by the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Selector for version containers, evaluated once at load.
    pub version_selector: String,
    /// Class of the clickable icon inside a version container.
    pub handler_class: String,
    /// Class marking the sibling block that holds a section's subsections.
    pub subsections_class: String,
    /// Class whose presence hides a block.
    pub hidden_class: String,
    /// Prefix of relational keys: rows belonging to `X` carry `<prefix>X`.
    pub parent_key_prefix: String,
    /// Appended to a version id to form the key of its top-level sections.
    pub top_level_suffix: String,
    /// Icon shown while a block is expanded.
    pub open_icon: String,
    /// Icon shown while a block is collapsed.
    pub closed_icon: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            version_selector: ".version".to_string(),
            handler_class: "handler".to_string(),
            subsections_class: "subsections".to_string(),
            hidden_class: "hidden".to_string(),
            parent_key_prefix: "parent-".to_string(),
            top_level_suffix: "-0".to_string(),
            open_icon: "resources/images/folder.png".to_string(),
            closed_icon: "resources/images/folder_closed.png".to_string(),
        }
    }
}

impl TreeConfig {
    /// Parses a TOML table; missing keys fall back to the defaults.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(src).map_err(|err| Error::InvalidConfig(err.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let class_fields = [
            ("handler_class", &self.handler_class),
            ("subsections_class", &self.subsections_class),
            ("hidden_class", &self.hidden_class),
        ];
        for (name, value) in class_fields {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a single non-empty class token, got {value:?}"
                )));
            }
        }
        if self.parent_key_prefix.is_empty() {
            return Err(Error::InvalidConfig(
                "parent_key_prefix must not be empty".into(),
            ));
        }
        if self.open_icon == self.closed_icon {
            return Err(Error::InvalidConfig(
                "open_icon and closed_icon must differ".into(),
            ));
        }
        Selector::parse(&self.version_selector).map_err(|_| {
            Error::InvalidConfig(format!(
                "version_selector is not supported: {}",
                self.version_selector
            ))
        })?;
        Ok(())
    }

    /// Key carried by the top-level section rows of version `version_id`.
    pub(crate) fn top_level_key(&self, version_id: &str) -> String {
        format!(
            "{}{}{}",
            self.parent_key_prefix, version_id, self.top_level_suffix
        )
    }

    /// Key carried by the subsection rows of section `section_id`.
    pub(crate) fn child_key(&self, section_id: &str) -> String {
        format!("{}{}", self.parent_key_prefix, section_id)
    }

    pub(crate) fn icon(&self, direction: Direction) -> &str {
        match direction {
            Direction::Open => &self.open_icon,
            Direction::Close => &self.closed_icon,
        }
    }
}
