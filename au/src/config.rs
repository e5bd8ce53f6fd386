//! Aurora configuration types and loading

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuroraResult;
use crate::footer::DEFAULT_VERSION_MARKER;
use crate::integrity::{AssetList, PreloadList};
use crate::page::{Page, PageSettings, Status};

/// Main Aurora configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level override (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// File whose keyword header carries the project version
    #[serde(rename = "project-file")]
    pub project_file: Option<PathBuf>,

    /// Keyword introducing the version header line
    #[serde(rename = "version-marker")]
    pub version_marker: String,

    /// The page to render
    pub page: PageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            project_file: None,
            version_marker: DEFAULT_VERSION_MARKER.to_string(),
            page: PageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .aurora.yml
        let local_config = PathBuf::from(".aurora.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/aurora/aurora.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aurora").join("aurora.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Effective log level: explicit setting, else derived from page status
    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| self.page.status.default_log_level())
    }
}

/// Page description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Directory holding the templates
    #[serde(rename = "template-dir")]
    pub template_dir: PathBuf,

    /// Template file name inside the template directory
    pub template: String,

    /// Project base directory
    pub base: PathBuf,

    /// Project base URL
    pub url: String,

    pub status: Status,

    /// Emit a content type header before the document
    pub html: bool,

    /// API hosts for DNS prefetch and preload hrefs
    pub api: Vec<String>,

    /// Stylesheets, local path → public URL
    pub css: AssetList,

    /// Scripts, local path → public URL
    pub js: AssetList,

    /// Preloads, URL fragment → resource type
    pub preload: PreloadList,

    /// Template variables
    pub vars: IndexMap<String, String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("html"),
            template: "index.html".to_string(),
            base: PathBuf::from("."),
            url: String::new(),
            status: Status::default(),
            html: false,
            api: Vec::new(),
            css: AssetList::new(),
            js: AssetList::new(),
            preload: PreloadList::new(),
            vars: IndexMap::new(),
        }
    }
}

impl PageConfig {
    /// Build a ready-to-render page
    pub fn build(&self) -> AuroraResult<Page> {
        let mut page = Page::new(PageSettings {
            template_dir: self.template_dir.clone(),
            template: self.template.clone(),
            base: self.base.clone(),
            url: self.url.clone(),
            status: self.status,
            html: self.html,
        })?;
        page.set_api(self.api.clone());
        page.set_css(self.css.clone());
        page.set_js(self.js.clone());
        page.set_preload(self.preload.clone());
        for (name, value) in &self.vars {
            page.set_var(name.clone(), value.clone());
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
log-level: INFO
project-file: index.rs
page:
  template-dir: html
  template: home.html
  url: https://example.com
  status: development
  api:
    - api.example.com
  css:
    css/site.css: https://api.example.com/css/site.css
    css/print.css: https://api.example.com/css/print.css
  preload:
    /css/site.css: style
  vars:
    title: Home
    description: Landing page
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version_marker, "$Aurora:");
        assert_eq!(config.page.template, "index.html");
        assert_eq!(config.page.status, Status::Production);
        assert_eq!(config.log_level(), "WARN");
    }

    #[test]
    fn test_parse_config_keeps_order() {
        let config: Config = serde_yaml::from_str(CONFIG).unwrap();

        assert_eq!(config.log_level(), "INFO");
        assert_eq!(config.page.template, "home.html");
        assert_eq!(config.page.status, Status::Development);
        let css: Vec<&Path> = config.page.css.keys().map(PathBuf::as_path).collect();
        assert_eq!(css, vec![Path::new("css/site.css"), Path::new("css/print.css")]);
        let vars: Vec<&str> = config.page.vars.keys().map(String::as_str).collect();
        assert_eq!(vars, vec!["title", "description"]);
    }

    #[test]
    fn test_status_drives_log_level() {
        let config: Config = serde_yaml::from_str("page:\n  status: development\n").unwrap();
        assert_eq!(config.log_level(), "DEBUG");
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("aurora.yml");
        fs::write(&path, CONFIG).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.project_file, Some(PathBuf::from("index.rs")));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_build_page() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("html")).unwrap();
        fs::write(temp.path().join("html").join("home.html"), "<title>{{title}}</title>\n").unwrap();

        let mut config: Config = serde_yaml::from_str(CONFIG).unwrap();
        config.page.template_dir = temp.path().join("html");
        config.page.base = temp.path().to_path_buf();

        let page = config.page.build().unwrap();
        assert_eq!(page.var("title"), Some("Home"));
        assert_eq!(page.assets().api, vec!["api.example.com".to_string()]);
        assert_eq!(page.assets().css.len(), 2);
    }
}
