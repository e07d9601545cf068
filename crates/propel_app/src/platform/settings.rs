use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use propel_engine::PropelConfig;
use propel_logging::{propel_info, propel_warn};

const CONFIG_FILENAME: &str = "propel.ron";

/// Loads configuration, then applies environment overrides.
///
/// An explicit `path` must exist and parse. The default `./propel.ron` is optional, and a
/// malformed default falls back to built-in settings with a warning.
pub fn load(path: Option<&Path>) -> Result<PropelConfig> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            ron::from_str(&content)
                .with_context(|| format!("cannot parse config file {}", path.display()))?
        }
        None => load_default(Path::new(CONFIG_FILENAME)),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn load_default(path: &Path) -> PropelConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PropelConfig::default();
        }
        Err(err) => {
            propel_warn!("Failed to read config from {:?}: {}", path, err);
            return PropelConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            propel_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            propel_warn!("Failed to parse config from {:?}: {}", path, err);
            PropelConfig::default()
        }
    }
}
