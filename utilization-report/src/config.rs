use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::transform::CsvExporter;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub summary_columns: Option<Vec<String>>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            summary_columns: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ExportConfig {
    pub fn exporter(&self) -> CsvExporter {
        match &self.summary_columns {
            Some(columns) => CsvExporter::new(columns.clone()),
            None => CsvExporter::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("UTILIZATION_REPORT_CONFIG")
            .unwrap_or_else(|_| "utilization-report.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
