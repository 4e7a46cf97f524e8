use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
struct WindowDefaults {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

#[derive(Debug, Clone, Deserialize)]
struct WindowEntry {
    id: String,
    category: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    descriptive_key: String,
    #[serde(default = "default_resizable")]
    resizable: bool,
    window_defaults: Option<WindowDefaults>,
    #[serde(default)]
    metadata: Option<toml::Table>,
}

fn default_resizable() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct WindowManifest {
    schema_version: u32,
    window: Vec<WindowEntry>,
}

#[derive(Serialize)]
struct CatalogGeometry {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    position: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    id: String,
    category: String,
    icon: String,
    descriptive_key: String,
    default_geometry: Option<CatalogGeometry>,
    resizable: bool,
    metadata: serde_json::Value,
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let path = crate_root.join("windows.manifest.toml");
    println!("cargo:rerun-if-changed={}", path.display());

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let manifest: WindowManifest = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    if manifest.schema_version != 1 {
        panic!(
            "manifest schema mismatch in {}: expected 1 found {}",
            path.display(),
            manifest.schema_version
        );
    }

    let mut seen = HashSet::new();
    let mut catalog = Vec::with_capacity(manifest.window.len());
    for entry in manifest.window {
        if !seen.insert(entry.id.clone()) {
            panic!("duplicate window id `{}` in {}", entry.id, path.display());
        }
        if !matches!(entry.category.as_str(), "persistent" | "transient") {
            panic!(
                "window `{}` has unknown category `{}`",
                entry.id, entry.category
            );
        }
        if let Some(defaults) = &entry.window_defaults {
            if defaults.width <= 0 || defaults.height <= 0 {
                panic!("window `{}` declares a non-positive default size", entry.id);
            }
        }
        let metadata = match entry.metadata {
            Some(table) => serde_json::to_value(table).expect("metadata to json"),
            None => serde_json::Value::Null,
        };
        catalog.push(CatalogEntry {
            default_geometry: entry.window_defaults.map(|d| CatalogGeometry {
                left: d.left,
                top: d.top,
                width: d.width,
                height: d.height,
                position: "fixed",
            }),
            id: entry.id,
            category: entry.category,
            icon: entry.icon,
            descriptive_key: entry.descriptive_key,
            resizable: entry.resizable,
            metadata,
        });
    }

    let json = serde_json::to_string_pretty(&catalog).expect("serialize window catalog");
    let generated = format!(
        "/// Build-time generated window catalog JSON.\n\
pub const WINDOW_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("window_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
