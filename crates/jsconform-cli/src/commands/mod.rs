//! CLI command implementations.

pub mod accept;
pub mod run;

use anyhow::anyhow;
use std::path::{Path, PathBuf};

use jsconform_harness::config::CONFIG_FILE;
use jsconform_harness::HarnessConfig;

/// Locate and parse the harness config: explicit `--config` or upward walk.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(PathBuf, HarnessConfig)> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let cwd = std::env::current_dir()?;
            HarnessConfig::find(&cwd).ok_or_else(|| {
                anyhow!(
                    "No {} found in this directory or any parent.\n\
                     Create one with an [engines.<id>] section, or pass --config.",
                    CONFIG_FILE
                )
            })?
        }
    };
    let config = HarnessConfig::load(&path)?;
    Ok((path, config))
}

/// Baseline path: CLI override, else config default relative to the config dir.
pub fn resolve_baseline_path(
    override_path: Option<&Path>,
    config: &HarnessConfig,
    config_path: &Path,
) -> PathBuf {
    match override_path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = &config.defaults.baseline;
            if default.is_absolute() {
                default.clone()
            } else {
                config_path
                    .parent()
                    .map(|d| d.join(default))
                    .unwrap_or_else(|| default.clone())
            }
        }
    }
}
