// src/config/validate.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LaneGraphError, Result};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$")
        .expect("hex color pattern is valid")
});

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LaneGraphError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.history, raw.palette))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_history(cfg)?;
    validate_palette(cfg)?;
    Ok(())
}

fn validate_history(cfg: &RawConfigFile) -> Result<()> {
    if cfg.history.batch_size == 0 {
        return Err(LaneGraphError::ConfigError(
            "[history].batch_size must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.history.max_pending_batches == 0 {
        return Err(LaneGraphError::ConfigError(
            "[history].max_pending_batches must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_palette(cfg: &RawConfigFile) -> Result<()> {
    if cfg.palette.colors.is_empty() {
        return Err(LaneGraphError::ConfigError(
            "[palette].colors must contain at least one color".to_string(),
        ));
    }

    for color in &cfg.palette.colors {
        if !HEX_COLOR.is_match(color) {
            return Err(LaneGraphError::ConfigError(format!(
                "[palette].colors entry '{}' is not a hex color like \"#40b0a6\"",
                color
            )));
        }
    }

    Ok(())
}
