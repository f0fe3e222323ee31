//! Settings from the command line and an optional TOML file

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use dockscope_logs::LevelFlags;
use dockscope_term::ColorMode;

/// Contents of a `--config` file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub network: Option<String>,
    pub levels: Vec<String>,
    pub filter: Vec<String>,
    pub service: Vec<String>,
    pub tail: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub color: Option<String>,
    pub docker_socket: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Options taken from the command line, before merging
#[derive(Debug, Default)]
pub struct CliOptions {
    pub network: Option<String>,
    pub levels: LevelFlags,
    pub filter: Vec<String>,
    pub service: Vec<String>,
    pub tail: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub color: Option<ColorMode>,
    pub docker_socket: Option<String>,
}

impl CliOptions {
    fn selects_levels(&self) -> bool {
        let l = &self.levels;
        l.all || l.errors || l.warnings || l.info || l.debug || !l.levels.is_empty()
    }
}

/// Final settings for a run
#[derive(Debug)]
pub struct Settings {
    pub network: String,
    pub levels: LevelFlags,
    pub keywords: Vec<String>,
    pub services: Vec<String>,
    pub tail: String,
    pub idle_timeout: Option<Duration>,
    pub color: ColorMode,
    pub docker_socket: Option<String>,
}

impl Settings {
    /// Merge command line options over the file; CLI values win
    pub fn resolve(cli: CliOptions, file: FileConfig) -> Result<Self> {
        let Some(network) = cli
            .network
            .clone()
            .or(file.network)
            .filter(|n| !n.trim().is_empty())
        else {
            bail!("--network is required (or set `network` in the config file)");
        };

        let levels = if cli.selects_levels() {
            cli.levels.clone()
        } else {
            LevelFlags {
                levels: file.levels,
                ..Default::default()
            }
        };

        let keywords = if cli.filter.is_empty() { file.filter } else { cli.filter };
        let services = if cli.service.is_empty() { file.service } else { cli.service };

        let tail = cli.tail.or(file.tail).unwrap_or_else(|| "all".to_string());
        let tail = parse_tail(&tail)?;

        let idle_timeout = cli
            .idle_timeout_secs
            .or(file.idle_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let color = match (cli.color, file.color) {
            (Some(mode), _) => mode,
            (None, Some(raw)) => raw.parse().map_err(anyhow::Error::msg)?,
            (None, None) => ColorMode::default(),
        };

        Ok(Self {
            network: network.trim().to_string(),
            levels,
            keywords,
            services,
            tail,
            idle_timeout,
            color,
            docker_socket: cli.docker_socket.or(file.docker_socket),
        })
    }
}

/// `all` or a line count
fn parse_tail(raw: &str) -> Result<String> {
    let tail = raw.trim().to_lowercase();
    if tail == "all" || tail.parse::<u64>().is_ok() {
        Ok(tail)
    } else {
        bail!("invalid tail '{raw}': expected 'all' or a number of lines")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(network: Option<&str>) -> CliOptions {
        CliOptions {
            network: network.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_full_file() {
        let file = FileConfig::parse(
            r#"
            network = "backend"
            levels = ["error", "warn"]
            filter = ["auth", "payment"]
            service = ["api"]
            tail = "100"
            idle_timeout_secs = 300
            color = "never"
            docker_socket = "/run/docker.sock"
            "#,
        )
        .unwrap();

        assert_eq!(file.network.as_deref(), Some("backend"));
        assert_eq!(file.levels, vec!["error", "warn"]);
        assert_eq!(file.filter, vec!["auth", "payment"]);
        assert_eq!(file.idle_timeout_secs, Some(300));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(FileConfig::parse("netwrok = \"x\"").is_err());
    }

    #[test]
    fn test_network_is_required() {
        let err = Settings::resolve(cli(None), FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--network"));

        assert!(Settings::resolve(cli(Some("  ")), FileConfig::default()).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(cli(Some("backend")), FileConfig::default()).unwrap();
        assert_eq!(settings.network, "backend");
        assert_eq!(settings.tail, "all");
        assert_eq!(settings.idle_timeout, None);
        assert_eq!(settings.color, ColorMode::Auto);
        assert!(settings.keywords.is_empty());
        assert!(settings.levels.levels.is_empty());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            network: Some("from-file".to_string()),
            levels: vec!["debug".to_string()],
            filter: vec!["file-word".to_string()],
            service: vec!["db".to_string()],
            tail: Some("10".to_string()),
            color: Some("always".to_string()),
            ..Default::default()
        };
        let mut options = cli(Some("from-cli"));
        options.levels.errors = true;
        options.filter = vec!["cli-word".to_string()];
        options.tail = Some("ALL".to_string());
        options.color = Some(ColorMode::Never);

        let settings = Settings::resolve(options, file).unwrap();
        assert_eq!(settings.network, "from-cli");
        assert!(settings.levels.errors);
        assert!(settings.levels.levels.is_empty());
        assert_eq!(settings.keywords, vec!["cli-word"]);
        assert_eq!(settings.services, vec!["db"]);
        assert_eq!(settings.tail, "all");
        assert_eq!(settings.color, ColorMode::Never);
    }

    #[test]
    fn test_file_levels_apply_without_cli_levels() {
        let file = FileConfig {
            levels: vec!["warn".to_string()],
            idle_timeout_secs: Some(30),
            ..Default::default()
        };
        let settings = Settings::resolve(cli(Some("net")), file).unwrap();
        assert_eq!(settings.levels.levels, vec!["warn"]);
        assert_eq!(settings.idle_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values() {
        let mut options = cli(Some("net"));
        options.tail = Some("lots".to_string());
        assert!(Settings::resolve(options, FileConfig::default()).is_err());

        let file = FileConfig {
            color: Some("rainbow".to_string()),
            ..Default::default()
        };
        assert!(Settings::resolve(cli(Some("net")), file).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network = \"staging\"\nservice = [\"web\"]").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.network.as_deref(), Some("staging"));
        assert_eq!(config.service, vec!["web"]);

        assert!(FileConfig::load(Path::new("/nonexistent/dockscope.toml")).is_err());
    }
}
