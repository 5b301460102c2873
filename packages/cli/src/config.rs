use msf_parser::{LineEnding, SerializerOptions, DEFAULT_INDEX_TAG};
use msf_editor::DEFAULT_PAGES_PER_FUNCTION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "msf.config.json";

const DEFAULT_PAGE_MAP_FILE: &str = ".msf-pages.json";

/// MSF configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Indent unit for serialized output
    #[serde(default = "default_indent")]
    pub indent: String,

    #[serde(default)]
    pub line_ending: LineEnding,

    /// Emit `<?xml ...?>` at the top of serialized output
    #[serde(default = "default_xml_declaration")]
    pub xml_declaration: bool,

    /// Leaf tag indexed by `msf lines`
    #[serde(default = "default_line_index_tag")]
    pub line_index_tag: String,

    /// Page span per function when the page total is unknown
    #[serde(default = "default_pages_per_function")]
    pub pages_per_function: u32,

    /// JSON file holding persisted page mappings, relative to the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_map_file: Option<String>,
}

fn default_indent() -> String {
    "  ".to_string()
}

fn default_xml_declaration() -> bool {
    true
}

fn default_line_index_tag() -> String {
    DEFAULT_INDEX_TAG.to_string()
}

fn default_pages_per_function() -> u32 {
    DEFAULT_PAGES_PER_FUNCTION
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn serializer_options(&self) -> SerializerOptions {
        SerializerOptions {
            indent: self.indent.clone(),
            line_ending: self.line_ending,
            xml_declaration: self.xml_declaration,
        }
    }

    /// Absolute path of the page mapping store
    pub fn page_map_path(&self, cwd: &str) -> PathBuf {
        let file = self.page_map_file.as_deref().unwrap_or(DEFAULT_PAGE_MAP_FILE);
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            PathBuf::from(cwd).join(path)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            line_ending: LineEnding::default(),
            xml_declaration: default_xml_declaration(),
            line_index_tag: default_line_index_tag(),
            pages_per_function: default_pages_per_function(),
            page_map_file: None,
        }
    }
}
