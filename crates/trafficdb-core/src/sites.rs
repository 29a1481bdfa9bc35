use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Contents of the tracked-sites YAML file.
///
/// ```yaml
/// tracked_urls:
///   - https://example.org/section-a/
///   - https://example.org/section-b/
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SitesFile {
    pub tracked_urls: Vec<String>,
}

/// Load and validate the tracked section URLs from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sites(&content)
}

/// Parse and validate tracked-sites YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError::SitesFileParse` for malformed YAML and
/// `ConfigError::Validation` for empty lists, non-http URLs, duplicates, or a
/// URL nested under another tracked URL.
pub fn parse_sites(content: &str) -> Result<SitesFile, ConfigError> {
    let sites: SitesFile = serde_yaml::from_str(content).map_err(ConfigError::SitesFileParse)?;
    validate_sites(&sites)?;
    Ok(sites)
}

fn validate_sites(sites: &SitesFile) -> Result<(), ConfigError> {
    if sites.tracked_urls.is_empty() {
        return Err(ConfigError::Validation(
            "tracked_urls must list at least one URL".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for url in &sites.tracked_urls {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "tracked URL \"{url}\" must start with http:// or https://"
            )));
        }
        if !seen.insert(url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "tracked URL \"{url}\" is listed more than once"
            )));
        }
    }

    for outer in &sites.tracked_urls {
        let prefix = with_trailing_slash(outer);
        if let Some(inner) = sites
            .tracked_urls
            .iter()
            .find(|other| *other != outer && other.starts_with(prefix.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "tracked URL \"{inner}\" is nested under \"{outer}\"; \
                 landing pages would be recorded under both"
            )));
        }
    }

    Ok(())
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
