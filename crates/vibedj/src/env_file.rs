//! `.env` loading.

use anyhow::Context;
use std::path::PathBuf;

/// Load variables from an env file into the process environment.
///
/// An explicitly named file must exist and parse. Without one, `./.env` (or
/// the first `.env` in a parent directory) is loaded if present. Variables
/// already set in the environment win over the file.
pub fn load(explicit: Option<&str>) -> anyhow::Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            let path = vibedj_core::Config::expand_path(path);
            dotenvy::from_path(&path)
                .with_context(|| format!("Error loading env file {}", path.display()))?;
            Ok(Some(path))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e).context("Error loading .env file"),
        },
    }
}
