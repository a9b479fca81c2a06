//! Scene catalog and scene text formatting
//!
//! Scene descriptors are opaque JSON documents owned by the rendering
//! capability. They are parsed here only to re-serialize them with
//! tab-indented pretty printing for the scene editor.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

/// A selectable scene source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneCatalogEntry {
    /// Label shown to the user
    pub label: String,
    /// Location of the JSON document
    pub url: String,
}

impl SceneCatalogEntry {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Fixed, ordered set of selectable scenes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneCatalog {
    entries: Vec<SceneCatalogEntry>,
}

impl SceneCatalog {
    /// Create a catalog from its entries
    pub fn new(entries: Vec<SceneCatalogEntry>) -> Self {
        Self { entries }
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[SceneCatalogEntry] {
        &self.entries
    }

    /// Find an entry by its label
    pub fn find_by_label(&self, label: &str) -> Option<&SceneCatalogEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Find an entry by its URL
    pub fn find_by_url(&self, url: &str) -> Option<&SceneCatalogEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    /// Resolve a label or URL to the URL to fetch
    ///
    /// Labels win over URLs. Unknown input is returned as-is so that
    /// uncataloged URLs can still be loaded.
    pub fn resolve<'a>(&'a self, label_or_url: &'a str) -> &'a str {
        self.find_by_label(label_or_url)
            .map(|e| e.url.as_str())
            .unwrap_or(label_or_url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SceneCatalogEntry> for SceneCatalog {
    fn from_iter<I: IntoIterator<Item = SceneCatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Scene text errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SceneError {
    #[error("Scene is not valid JSON: {0}")]
    Parse(String),

    #[error("Failed to format scene: {0}")]
    Format(String),
}

/// Parse a scene document and pretty-print it with tab indentation
///
/// Object keys keep their document order.
pub fn format_scene(body: &str) -> Result<String, SceneError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| SceneError::Parse(e.to_string()))?;

    let mut out = Vec::with_capacity(body.len());
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut serializer)
        .map_err(|e| SceneError::Format(e.to_string()))?;

    String::from_utf8(out).map_err(|e| SceneError::Format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_scene_tab_indented() {
        let body = r#"{"camera":{"fovy":45},"lights":[],"objects":[{"type":"Sphere","radius":1}]}"#;
        let expected = "{\n\t\"camera\": {\n\t\t\"fovy\": 45\n\t},\n\t\"lights\": [],\n\t\"objects\": [\n\t\t{\n\t\t\t\"type\": \"Sphere\",\n\t\t\t\"radius\": 1\n\t\t}\n\t]\n}";
        assert_eq!(format_scene(body).unwrap(), expected);
    }

    #[test]
    fn test_format_scene_keeps_key_order() {
        let formatted = format_scene(r#"{"z":1,"a":2}"#).unwrap();
        assert!(formatted.find("\"z\"").unwrap() < formatted.find("\"a\"").unwrap());
    }

    #[test]
    fn test_format_scene_is_stable() {
        let once = format_scene(r#"{"foo": [1, 2, {"bar": null}]}"#).unwrap();
        assert_eq!(format_scene(&once).unwrap(), once);
    }

    #[test]
    fn test_format_scene_rejects_malformed() {
        let err = format_scene("{\"camera\": ").unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog: SceneCatalog = [
            SceneCatalogEntry::new("Materials", "scenes/materials.json"),
            SceneCatalogEntry::new("Mirrors", "scenes/mirrors.json"),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.find_by_url("scenes/mirrors.json").map(|e| e.label.as_str()),
            Some("Mirrors")
        );
        assert_eq!(catalog.resolve("Materials"), "scenes/materials.json");
        assert_eq!(catalog.resolve("other/scene.json"), "other/scene.json");
        assert!(catalog.find_by_label("Missing").is_none());
    }
}
