use std::path::Path;

use finsight_core::UnderwritingThresholds;
use tracing::debug;

use crate::input;

/// Load and validate a thresholds file. `.yaml`/`.yml` files are read as
/// YAML, everything else as JSON. Missing fields keep their defaults.
pub fn load_thresholds(path: &str) -> Result<UnderwritingThresholds, Box<dyn std::error::Error>> {
    let (canonical, contents) = input::file::read_text(path)?;
    let thresholds = parse_thresholds(&contents, is_yaml(&canonical))
        .map_err(|e| format!("Invalid config '{}': {}", canonical.display(), e))?;
    debug!(path = %canonical.display(), ?thresholds, "Loaded underwriting thresholds");
    Ok(thresholds)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_thresholds(
    contents: &str,
    yaml: bool,
) -> Result<UnderwritingThresholds, Box<dyn std::error::Error>> {
    let thresholds: UnderwritingThresholds = if yaml {
        serde_yaml::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    };
    thresholds.validate()?;
    Ok(thresholds)
}
