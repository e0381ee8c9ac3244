use std::path::{Path, PathBuf};

use {anyhow::Context, tracing::debug};

use crate::{env_subst::substitute_env, schema::PrunebotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "prunebot.toml",
    "prunebot.yaml",
    "prunebot.yml",
    "prunebot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PrunebotConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path).with_context(|| format!("failed to parse {}", path.display()))
}

/// Load config from `explicit` if given, otherwise from standard locations.
///
/// An explicit directory is searched for the standard file names and must
/// contain one. Without `explicit` the search order is:
/// 1. `./prunebot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/prunebot/prunebot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PrunebotConfig::default()` if no config file is found. A file
/// that exists but fails to parse is an error: sweeping with a guessed
/// config would delete the wrong things.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<PrunebotConfig> {
    if let Some(path) = explicit {
        if path.is_dir() {
            let file = first_existing(path).with_context(|| {
                format!("no prunebot config file in {}", path.display())
            })?;
            debug!(path = %file.display(), "loading config from explicit directory");
            return load_config(&file);
        }
        debug!(path = %path.display(), "loading explicit config");
        return load_config(path);
    }
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(PrunebotConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    first_existing(Path::new(".")).or_else(|| user_config_dir().and_then(|d| first_existing(&d)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// `~/.config/prunebot/`.
fn user_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("prunebot"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PrunebotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
