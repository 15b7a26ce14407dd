use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConfigError;

/// The four harvested storefronts, named by the identifiers the driver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteId {
    AllendaleWine,
    BuyRiteWines,
    GarysWine,
    WineLibrary,
}

impl SiteId {
    pub const ALL: [SiteId; 4] = [
        SiteId::AllendaleWine,
        SiteId::BuyRiteWines,
        SiteId::GarysWine,
        SiteId::WineLibrary,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SiteId::AllendaleWine => "allendalewine",
            SiteId::BuyRiteWines => "buyritewines",
            SiteId::GarysWine => "garyswine",
            SiteId::WineLibrary => "winelibrary",
        }
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown site \"{0}\"; expected one of allendalewine, buyritewines, garyswine, winelibrary")]
pub struct UnknownSite(pub String);

impl FromStr for SiteId {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SiteId::ALL
            .into_iter()
            .find(|site| site.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSite(s.to_owned()))
    }
}

/// Per-site overrides read from the optional sites YAML file.
///
/// Every field except `site` is optional; absent fields keep the adapter's
/// built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteOverride {
    pub site: SiteId,
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub categories: Option<Vec<String>>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteOverride>,
}

impl SitesFile {
    /// Returns the override entry for `site`, if the file has one.
    #[must_use]
    pub fn get(&self, site: SiteId) -> Option<&SiteOverride> {
        self.sites.iter().find(|o| o.site == site)
    }

    /// Returns `false` only when the file explicitly disables `site`.
    #[must_use]
    pub fn is_enabled(&self, site: SiteId) -> bool {
        self.get(site).is_none_or(|o| o.enabled)
    }
}

/// Load and validate site overrides from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_site_overrides(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile = serde_yaml::from_str(&content)?;

    validate_sites(&sites_file)?;

    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in &sites_file.sites {
        if !seen.insert(entry.site) {
            return Err(ConfigError::Validation(format!(
                "duplicate entry for site '{}'",
                entry.site
            )));
        }

        if entry.page_size == Some(0) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has page_size 0; must be at least 1",
                entry.site
            )));
        }

        if let Some(base_url) = &entry.base_url {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "site '{}' base_url '{base_url}' must be an http(s) URL",
                    entry.site
                )));
            }
        }

        if let Some(categories) = &entry.categories {
            if categories.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "site '{}' has an empty category",
                    entry.site
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SitesFile {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    #[test]
    fn site_id_round_trips_driver_names() {
        for site in SiteId::ALL {
            assert_eq!(site.as_str().parse::<SiteId>().unwrap(), site);
            assert_eq!(site.to_string(), site.as_str());
        }
    }

    #[test]
    fn site_id_parse_is_case_insensitive() {
        assert_eq!("GarysWine".parse::<SiteId>().unwrap(), SiteId::GarysWine);
    }

    #[test]
    fn site_id_rejects_unknown_name() {
        let err = "totalwine".parse::<SiteId>().unwrap_err();
        assert_eq!(err, UnknownSite("totalwine".to_owned()));
    }

    #[test]
    fn overrides_deserialize_with_defaults() {
        let file = parse(
            "sites:\n  - site: garyswine\n    page_size: 50\n    categories: [wines, spirits]\n",
        );
        let entry = file.get(SiteId::GarysWine).unwrap();
        assert_eq!(entry.page_size, Some(50));
        assert_eq!(
            entry.categories.as_deref(),
            Some(&["wines".to_owned(), "spirits".to_owned()][..])
        );
        assert!(entry.enabled);
        assert!(entry.base_url.is_none());
        assert!(file.get(SiteId::WineLibrary).is_none());
    }

    #[test]
    fn disabled_site_is_reported() {
        let file = parse("sites:\n  - site: winelibrary\n    enabled: false\n");
        assert!(!file.is_enabled(SiteId::WineLibrary));
        assert!(file.is_enabled(SiteId::AllendaleWine));
    }

    #[test]
    fn validate_rejects_duplicate_site() {
        let file = parse("sites:\n  - site: garyswine\n  - site: garyswine\n");
        let err = validate_sites(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate entry"));
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let file = parse("sites:\n  - site: buyritewines\n    page_size: 0\n");
        let err = validate_sites(&file).unwrap_err();
        assert!(err.to_string().contains("page_size 0"));
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let file = parse("sites:\n  - site: buyritewines\n    base_url: ftp://example.com/\n");
        let err = validate_sites(&file).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn unknown_site_name_fails_to_parse() {
        let result = serde_yaml::from_str::<SitesFile>("sites:\n  - site: totalwine\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_site_overrides_reports_missing_file() {
        let err = load_site_overrides(Path::new("/definitely/not/here/sites.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::SitesFileIo { .. }));
    }
}
