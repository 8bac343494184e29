use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WindowTypeManifest {
    schema_version: u32,
    type_name: String,
    title: String,
    width: i32,
    height: i32,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    styles: BTreeMap<String, String>,
    #[serde(default)]
    show_on_desktop: bool,
    #[serde(default)]
    home_url: Option<String>,
}

fn manifest_paths(root: &Path) -> Vec<PathBuf> {
    let dir = root.join("window_types");
    println!("cargo:rerun-if-changed={}", dir.display());
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", dir.display()))
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    paths
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let mut manifests = Vec::<WindowTypeManifest>::new();

    for path in manifest_paths(&crate_root) {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let manifest: WindowTypeManifest = toml::from_str(&raw)
            .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
        if manifest.schema_version != 1 {
            panic!(
                "manifest schema mismatch in {}: expected 1 found {}",
                path.display(),
                manifest.schema_version
            );
        }
        if manifest.type_name == "window" {
            panic!(
                "{} redefines the built-in base window type",
                path.display()
            );
        }
        if manifests.iter().any(|m| m.type_name == manifest.type_name) {
            panic!(
                "duplicate window type `{}` in {}",
                manifest.type_name,
                path.display()
            );
        }
        manifests.push(manifest);
    }

    manifests.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    let json =
        serde_json::to_string_pretty(&manifests).expect("serialize window type catalog");
    let generated = format!(
        "/// Build-time generated window type catalog JSON.\n\
pub const WINDOW_TYPE_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("window_type_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
