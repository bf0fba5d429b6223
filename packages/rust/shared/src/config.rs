//! Application configuration for topicpress.
//!
//! User config lives at `~/.topicpress/topicpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicPressError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topicpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topicpress";

/// Placeholder substituted with the product identifier in path templates.
const PRODUCT_PLACEHOLDER: &str = "{product}";

// ---------------------------------------------------------------------------
// Config structs (matching topicpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Conventional file names inside a documentation checkout.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// External renderer settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Product identifier used when none is given on the command line.
    #[serde(default = "default_product")]
    pub product: String,

    /// Document ids always excluded from the output.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Directory holding `<product>-documentation` checkouts.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// Directory receiving rendered PDFs.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            ignore: Vec::new(),
            work_dir: default_work_dir(),
            build_dir: default_build_dir(),
        }
    }
}

fn default_product() -> String {
    "teamcity".into()
}
fn default_work_dir() -> String {
    "temp".into()
}
fn default_build_dir() -> String {
    "build".into()
}

/// `[layout]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Table-of-contents file, relative to the checkout root.
    #[serde(default = "default_tree_file")]
    pub tree_file: String,

    /// Version file, relative to the checkout root.
    #[serde(default = "default_version_file")]
    pub version_file: String,

    /// Directory holding the markdown topics, relative to the checkout root.
    #[serde(default = "default_topics_dir")]
    pub topics_dir: String,

    /// Combined markdown file name, written inside the topics directory.
    #[serde(default = "default_combined_file")]
    pub combined_file: String,

    /// Logo image path; `{product}` is replaced with the product identifier.
    #[serde(default = "default_logo_template")]
    pub logo_template: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tree_file: default_tree_file(),
            version_file: default_version_file(),
            topics_dir: default_topics_dir(),
            combined_file: default_combined_file(),
            logo_template: default_logo_template(),
        }
    }
}

fn default_tree_file() -> String {
    "tc.tree".into()
}
fn default_version_file() -> String {
    "current.help.version".into()
}
fn default_topics_dir() -> String {
    "topics".into()
}
fn default_combined_file() -> String {
    "_combined.md".into()
}
fn default_logo_template() -> String {
    "node_modules/@jetbrains/logos/{product}/og-image-1200x630.png".into()
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Whether `build` invokes the renderer after emitting the combined file.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Renderer executable.
    #[serde(default = "default_render_command")]
    pub command: String,

    /// Input markdown flavor passed to the renderer.
    #[serde(default = "default_from")]
    pub from: String,

    /// PDF engine used by the renderer.
    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,

    /// Stylesheet reference.
    #[serde(default = "default_stylesheet", skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,

    /// Syntax highlighting style.
    #[serde(
        default = "default_highlight_style",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlight_style: Option<String>,

    /// Page size, e.g. `A4` or `Letter`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,

    /// Page orientation: `Portrait` or `Landscape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_render_command(),
            from: default_from(),
            pdf_engine: default_pdf_engine(),
            stylesheet: default_stylesheet(),
            highlight_style: default_highlight_style(),
            page_size: None,
            orientation: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_render_command() -> String {
    "pandoc".into()
}
fn default_from() -> String {
    "gfm".into()
}
fn default_pdf_engine() -> String {
    "wkhtmltopdf".into()
}
fn default_stylesheet() -> Option<String> {
    Some("styles.css".into())
}
fn default_highlight_style() -> Option<String> {
    Some("pygments".into())
}

// ---------------------------------------------------------------------------
// Path resolution helpers
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Checkout root for a product: `<work_dir>/<product>-documentation`.
    pub fn source_root(&self, product: &str) -> PathBuf {
        PathBuf::from(&self.defaults.work_dir).join(format!("{product}-documentation"))
    }

    /// Default PDF destination for a product: `<build_dir>/<product>-docs.pdf`.
    pub fn default_pdf_path(&self, product: &str) -> PathBuf {
        PathBuf::from(&self.defaults.build_dir).join(format!("{product}-docs.pdf"))
    }

    /// Logo image path for a product, from `logo_template`.
    pub fn logo_path(&self, product: &str) -> PathBuf {
        PathBuf::from(
            self.layout
                .logo_template
                .replace(PRODUCT_PLACEHOLDER, product),
        )
    }

    /// Merge the configured ignore list with a comma-separated CLI list.
    pub fn exclusions(&self, cli_ignore: Option<&str>) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self
            .defaults
            .ignore
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if let Some(list) = cli_ignore {
            set.extend(parse_ignore_list(list));
        }
        set
    }
}

/// Split a comma-separated list of document ids. Whitespace is trimmed and
/// empty entries are dropped.
pub fn parse_ignore_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topicpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topicpress/topicpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicPressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TopicPressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicPressError::write(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicPressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicPressError::write(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("tc.tree"));
        assert!(toml_str.contains("wkhtmltopdf"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.product, "teamcity");
        assert_eq!(parsed.layout.combined_file, "_combined.md");
        assert_eq!(parsed.render.stylesheet.as_deref(), Some("styles.css"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[defaults]
product = "youtrack"
ignore = ["youtrack-documentation.md"]

[render]
page_size = "A4"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.product, "youtrack");
        assert_eq!(config.defaults.work_dir, "temp");
        assert_eq!(config.layout.version_file, "current.help.version");
        assert_eq!(config.render.page_size.as_deref(), Some("A4"));
        assert_eq!(config.render.command, "pandoc");
        assert!(config.render.enabled);
    }

    #[test]
    fn product_paths_follow_conventions() {
        let config = AppConfig::default();
        assert_eq!(
            config.source_root("teamcity"),
            PathBuf::from("temp").join("teamcity-documentation")
        );
        assert_eq!(
            config.default_pdf_path("teamcity"),
            PathBuf::from("build").join("teamcity-docs.pdf")
        );
        assert_eq!(
            config.logo_path("hub"),
            PathBuf::from("node_modules/@jetbrains/logos/hub/og-image-1200x630.png")
        );
    }

    #[test]
    fn ignore_list_is_trimmed_and_merged() {
        assert_eq!(
            parse_ignore_list(" a.md, b.md ,,c.md "),
            vec!["a.md", "b.md", "c.md"]
        );
        assert!(parse_ignore_list("").is_empty());

        let mut config = AppConfig::default();
        config.defaults.ignore = vec!["teamcity-documentation.md".into()];
        let set = config.exclusions(Some("skip.md,skip.md"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("skip.md"));
        assert!(set.contains("teamcity-documentation.md"));
    }
}
