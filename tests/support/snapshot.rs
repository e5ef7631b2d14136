//! Snapshot files on disk.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// One listing in the snapshot file format.
pub fn listing(id: &str, yes: f64) -> Value {
    json!({
        "id": id,
        "question": format!("Will {id} happen?"),
        "outcomes": ["Yes", "No"],
        "prices": {
            "Yes": yes,
            "No": format!("{:.4}", 1.0 - yes),
        },
    })
}

/// Write `{"markets": [...]}` into `dir` and return its path.
pub fn write(dir: &Path, markets: Vec<Value>) -> PathBuf {
    let path = dir.join("markets.json");
    let body = json!({ "markets": markets });
    std::fs::write(&path, body.to_string()).expect("write snapshot");
    path
}

/// Write a config file into `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).expect("write config");
    path
}
