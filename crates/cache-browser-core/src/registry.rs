//! Component registry: which release currently supplies each component.
//!
//! Each release only ships the components it adds or changes, so resource
//! locators are resolved against the owning release rather than the
//! release being served. Registration is last-writer-wins with no conflict
//! detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Release that owns unregistered components.
pub const DEFAULT_VERSION: &str = "v0.1.0";

/// Components shipped by the base release.
pub const BASE_COMPONENTS: &[&str] = &[
    "top-nav",
    "namespace-tabs",
    "status-bar",
    "file-tree",
    "content-viewer",
];

/// Resource locators for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPaths {
    pub js: String,
    pub html: String,
    pub css: String,
}

/// Maps component names to the release that supplies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRegistry {
    version: String,
    base_path: String,
    components: BTreeMap<String, String>,
}

impl ComponentRegistry {
    /// Empty registry serving `version` from `base_path`.
    pub fn new(version: impl Into<String>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        let base_path = if base_path.is_empty() {
            "..".to_string()
        } else {
            base_path.trim_end_matches('/').to_string()
        };
        Self {
            version: version.into(),
            base_path,
            components: BTreeMap::new(),
        }
    }

    /// Registry pre-populated with the base release's components.
    pub fn with_base_components(version: impl Into<String>, base_path: impl Into<String>) -> Self {
        let mut registry = Self::new(version, base_path);
        for name in BASE_COMPONENTS {
            registry.register_component(*name, DEFAULT_VERSION);
        }
        registry
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Stylesheet shared by every component of the served release.
    pub fn shared_css(&self) -> String {
        format!("{}/{}/css/common.css", self.base_path, self.version)
    }

    /// Record that `version` supplies `name`. Later calls win.
    pub fn register_component(&mut self, name: impl Into<String>, version: impl Into<String>) {
        let name = name.into();
        let version = version.into();
        tracing::debug!(component = %name, version = %version, "Registered component");
        self.components.insert(name, version);
    }

    /// Register several components at once.
    pub fn register_components<I, N, V>(&mut self, components: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut count = 0;
        for (name, version) in components {
            self.components.insert(name.into(), version.into());
            count += 1;
        }
        tracing::debug!(count, "Registered components");
    }

    /// Owning release of `name`, or the served release if never registered.
    pub fn component_version(&self, name: &str) -> &str {
        self.components
            .get(name)
            .map(String::as_str)
            .unwrap_or(&self.version)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Snapshot of every registration.
    pub fn list_components(&self) -> BTreeMap<String, String> {
        self.components.clone()
    }

    /// Component names grouped by owning release.
    pub fn group_by_version(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, version) in &self.components {
            groups.entry(version.clone()).or_default().push(name.clone());
        }
        groups
    }

    /// Script, markup and stylesheet locators for `name`.
    pub fn component_paths(&self, name: &str) -> ComponentPaths {
        let base = format!(
            "{}/{}/components/{}",
            self.base_path,
            self.component_version(name),
            name
        );
        ComponentPaths {
            js: format!("{base}/{name}.js"),
            html: format!("{base}/{name}.html"),
            css: format!("{base}/{name}.css"),
        }
    }

    pub fn service_path(&self, service: &str, version: Option<&str>) -> String {
        let version = version.unwrap_or(&self.version);
        format!("{}/{}/js/{}", self.base_path, version, service)
    }

    pub fn data_path(&self, data: &str, version: Option<&str>) -> String {
        let version = version.unwrap_or(&self.version);
        format!("{}/{}/data/{}", self.base_path, version, data)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_base_components(DEFAULT_VERSION, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut registry = ComponentRegistry::new("v0.1.3", "/console/v0/v0.1");
        registry.register_component("view-tabs", "v0.1.1");
        let earlier = registry.component_paths("view-tabs");

        registry.register_component("view-tabs", "v0.1.2");

        assert_eq!(registry.component_version("view-tabs"), "v0.1.2");
        // Already resolved locators are plain values and never rebind
        assert_eq!(
            earlier.js,
            "/console/v0/v0.1/v0.1.1/components/view-tabs/view-tabs.js"
        );
        assert_eq!(
            registry.component_paths("view-tabs").css,
            "/console/v0/v0.1/v0.1.2/components/view-tabs/view-tabs.css"
        );
    }

    #[test]
    fn test_unregistered_falls_back_to_served_version() {
        let registry = ComponentRegistry::new("v0.1.3", "/c");
        assert!(!registry.has_component("html-panel"));
        assert_eq!(registry.component_version("html-panel"), "v0.1.3");
        assert_eq!(
            registry.component_paths("html-panel").html,
            "/c/v0.1.3/components/html-panel/html-panel.html"
        );
    }

    #[test]
    fn test_service_and_data_paths() {
        let registry = ComponentRegistry::new("v0.1.1", "/c/");
        assert_eq!(registry.base_path(), "/c");
        assert_eq!(
            registry.service_path("services/cache-api-client.js", None),
            "/c/v0.1.1/js/services/cache-api-client.js"
        );
        assert_eq!(
            registry.data_path("shortcuts.json", Some("v0.1.0")),
            "/c/v0.1.0/data/shortcuts.json"
        );
        assert_eq!(registry.shared_css(), "/c/v0.1.1/css/common.css");
    }

    #[test]
    fn test_empty_base_path_is_relative() {
        let registry = ComponentRegistry::new("v0.1.0", "");
        assert_eq!(registry.service_path("x.js", None), "../v0.1.0/js/x.js");
    }

    #[test]
    fn test_group_by_version() {
        let mut registry = ComponentRegistry::with_base_components("v0.1.1", "/c");
        registry.register_components([
            ("view-tabs", "v0.1.1"),
            ("files-view", "v0.1.1"),
            ("hashes-view", "v0.1.1"),
        ]);

        let groups = registry.group_by_version();
        assert_eq!(groups["v0.1.0"].len(), BASE_COMPONENTS.len());
        assert_eq!(
            groups["v0.1.1"],
            vec!["files-view", "hashes-view", "view-tabs"]
        );
        assert_eq!(registry.list_components().len(), BASE_COMPONENTS.len() + 3);
    }
}
