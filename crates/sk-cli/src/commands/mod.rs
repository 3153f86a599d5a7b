pub mod play;
pub mod room;

use std::path::Path;

use sk_combat::TrackerConfig;

/// Load tracker settings from a JSON file, or the defaults if none is given.
fn load_config(path: Option<&Path>) -> Result<TrackerConfig, String> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    TrackerConfig::from_json(&json).map_err(|e| e.to_string())
}
