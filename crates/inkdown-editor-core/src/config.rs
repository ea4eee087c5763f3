//! Editor configuration.

use std::time::Duration;
use std::{env, fs, path::Path};

use miette::miette;
use serde::{Deserialize, Serialize};

use inkdown_renderer::ThemeId;

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period for the preview debounce, in milliseconds.
    pub debounce_ms: u64,
    /// Theme name preselected in the export menu.
    pub export_theme: String,
    /// Whether the preview pane starts visible.
    pub show_preview: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            export_theme: "default".into(),
            show_preview: true,
        }
    }
}

impl EditorConfig {
    pub fn load(config_file: &Path) -> miette::Result<EditorConfig> {
        let mut config_string = fs::read_to_string(config_file)
            .map_err(|e| miette!("error reading config file {}", e))?;
        // substitute environment variables in config file
        for (k, v) in env::vars() {
            config_string = config_string.replace(&format!("${}", k), &v);
        }

        toml::from_str(&config_string).map_err(|e| miette!("error parsing config file {}", e))
    }

    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn theme(&self) -> ThemeId {
        ThemeId::parse(&self.export_theme)
    }
}
