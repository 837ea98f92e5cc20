//! Shared fixture access for tween tests and benches.
//!
//! Fixtures live under the workspace `fixtures/` directory and are indexed by
//! `fixtures/manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    tweens: HashMap<String, String>,
    #[serde(default)]
    scenarios: HashMap<String, ScenarioEntry>,
}

#[derive(Debug, Deserialize)]
struct ScenarioEntry {
    tween: String,
    expect: String,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Tween configs, one JSON object per file.
pub mod tweens {
    use super::*;

    /// Fixture names, sorted.
    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.tweens.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.tweens, "tween", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.tweens, "tween", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.tweens, "tween", name)?;
        Ok(resolve_path(rel))
    }
}

/// A tween config paired with the timeline it is expected to produce.
pub mod scenarios {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.scenarios.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn tween_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        read_to_string(&entry.tween)
    }

    pub fn tween<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        super::load_json(&entry.tween)
    }

    pub fn expect<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.scenarios, "scenario", name)?;
        super::load_json(&entry.expect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tween_fixture_is_valid_json() {
        for name in tweens::keys() {
            let value: serde_json::Value = tweens::load(&name).unwrap();
            assert!(value.is_object(), "{name} should be a JSON object");
        }
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        let err = tweens::json("does_not_exist").unwrap_err();
        assert!(err.to_string().contains("does_not_exist"));
    }

    #[test]
    fn scenarios_resolve_both_files() {
        for name in scenarios::keys() {
            let _: serde_json::Value = scenarios::tween(&name).unwrap();
            let _: serde_json::Value = scenarios::expect(&name).unwrap();
        }
    }
}
