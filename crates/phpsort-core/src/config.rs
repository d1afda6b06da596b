//! Engine configuration

use crate::element::Visibility;
use crate::error::SortError;

/// Toggles for one sorting run; immutable once built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub sort_properties: bool,
    pub sort_traits: bool,
    pub sort_namespace_uses: bool,
    pub sort_constants: bool,
    pub remove_unused_imports: bool,
    pub add_newline_between_const_and_properties: bool,
    pub add_visibility_spacing: bool,
    /// Visibility assumed for declarations without a modifier
    pub default_visibility: Visibility,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            sort_properties: true,
            sort_traits: true,
            sort_namespace_uses: true,
            sort_constants: true,
            remove_unused_imports: false,
            add_newline_between_const_and_properties: true,
            add_visibility_spacing: true,
            default_visibility: Visibility::Public,
        }
    }
}

impl SortConfig {
    /// Set the default visibility from its configuration string
    pub fn with_default_visibility(mut self, visibility: &str) -> Result<Self, SortError> {
        self.default_visibility = visibility.parse()?;
        Ok(self)
    }

    /// Whether any class-scope category is enabled
    pub fn sorts_class_members(&self) -> bool {
        self.sort_traits || self.sort_constants || self.sort_properties
    }
}
