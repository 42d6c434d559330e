use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

pub const OVERRIDES_STYLESHEET: &str = "overrides.css";

/// Presentation fixes for the search start page so the synced background
/// shows through its opaque panels.
const COSMETIC_OVERRIDES: &str = "\
body > div.L3eUgb > div.o3j99.ikrT4e.om7nvf > form > div:nth-child(1) > div.A8SBwf > div.RNNXgb {background-color: transparent !important;}
#gb {background-color: transparent !important;}
body > div.L3eUgb > div.o3j99.c93Gbe {background-color: transparent !important;}
body > div.L3eUgb > div.o3j99.c93Gbe > div.uU7dJb {border: none !important;}
#searchform > div.sfbg {background-color: transparent !important;}
#appbar {background-color: transparent !important;}
.rsGxI.Ww4FFb, .Ww4FFb {background-color: transparent !important;}
.RNNXgb, .GKS7s {background-color: transparent !important;}
.F9Idpe {background: transparent !important}
";

/// Writes the cosmetic overrides into `dir`. Returns `false` when the file
/// already held exactly these rules.
pub fn apply_overrides(dir: &Path) -> Result<bool> {
    let path = overrides_path(dir);
    if fs::read_to_string(&path).is_ok_and(|existing| existing == COSMETIC_OVERRIDES) {
        debug!(path = %path.display(), "style overrides already in place");
        return Ok(false);
    }
    fs::write(&path, COSMETIC_OVERRIDES)
        .with_context(|| format!("failed to write style overrides to {}", path.display()))?;
    info!(path = %path.display(), "applied style overrides");
    Ok(true)
}

pub fn overrides_path(dir: &Path) -> PathBuf {
    dir.join(OVERRIDES_STYLESHEET)
}
