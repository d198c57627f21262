use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Sqlite,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Sqlite => "db",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SemgraphConfig {
    /// Directory receiving one artifact per repository
    pub output: Option<String>,
    pub format: Option<OutputFormat>,
    /// Extra gitignore-style patterns
    pub exclude: Vec<String>,
    /// code2flow JSON document to integrate
    pub call_graph: Option<String>,
    /// Program to run for call graphs
    pub code2flow: Option<String>,
    pub threads: Option<usize>,
}

impl SemgraphConfig {
    /// Starting point written by `semgraph init`
    pub fn starter() -> Self {
        Self {
            output: Some(default_output_dir().to_string_lossy().into_owned()),
            format: Some(OutputFormat::Json),
            exclude: vec!["tests/fixtures/".to_string()],
            call_graph: None,
            code2flow: None,
            threads: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("semgraph.toml")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from(".semgraph")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SemgraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SemgraphConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SemgraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_output_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("semgraph.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semgraph.toml");
        let config = SemgraphConfig::starter();

        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config.clone()));

        // Refuses to overwrite unless forced
        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semgraph.toml");
        std::fs::write(&path, "format = \"sqlite\"\nthreads = 2\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.format, Some(OutputFormat::Sqlite));
        assert_eq!(config.threads, Some(2));
        assert!(config.exclude.is_empty());
        assert_eq!(OutputFormat::Sqlite.extension(), "db");
    }
}
