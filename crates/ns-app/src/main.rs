//! Command line browser for nuScenes datasets

use std::io;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ns_core::{Category, DatasetNavigator};
use ns_data::{load_dataset, DatasetConfig, SqliteLake, SqliteLakeConnector};

mod commands;
mod session;

use session::Session;

#[derive(Parser, Debug)]
#[command(name = "nsview", version, about = "Browse nuScenes scenes by timestamp")]
struct Cli {
    #[command(subcommand)]
    command: Option<Mode>,

    /// JSON configuration file, overridden by the flags below
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset location: local path, file://, s3://, s3a:// or sqlite:// URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Cache directory for remote datasets
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Category to open first (samples or sweeps)
    #[arg(long, global = true)]
    category: Option<Category>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Read browsing commands from stdin (default)
    Browse {
        /// Load the dataset before reading commands
        #[arg(long)]
        load: bool,
    },
    /// Copy a local dataset tree into a SQLite lake
    Mirror {
        /// Root of the local dataset
        from: PathBuf,
        /// Lake database to create or extend
        to: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    fn dataset_config(&self) -> Result<DatasetConfig> {
        let mut config = match &self.config {
            Some(path) => DatasetConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DatasetConfig::default(),
        };
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(category) = self.category {
            config.category = category;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.dataset_config()?;

    match cli.command.unwrap_or(Mode::Browse { load: false }) {
        Mode::Browse { load } => browse(config, load),
        Mode::Mirror { from, to } => mirror(&from, &to),
        Mode::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn browse(config: DatasetConfig, load: bool) -> Result<()> {
    info!("Starting nuScenes browser on {}", config.url);

    let source = load_dataset(&config, &SqliteLakeConnector, None)
        .with_context(|| format!("Failed to open dataset {}", config.url))?;
    let mut session = Session::new(DatasetNavigator::new(source, config.category));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let script = if load { "load\n" } else { "" };
    session.run(script.as_bytes(), stdout.lock())?;

    if let Err(e) = session.run(stdin.lock(), stdout.lock()) {
        error!("Browser stopped: {e:#}");
        return Err(e);
    }
    Ok(())
}

fn mirror(from: &std::path::Path, to: &std::path::Path) -> Result<()> {
    let lake = SqliteLake::create(to)
        .with_context(|| format!("Failed to create lake {}", to.display()))?;
    let count = lake
        .import_dir(from)
        .with_context(|| format!("Failed to import {}", from.display()))?;
    println!("Mirrored {} files into sqlite://{}", count, to.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsview.json");
        let mut stored = DatasetConfig::new("sqlite:///data/lake.db");
        stored.category = Category::Sweeps;
        stored.to_file(&path).unwrap();

        let cli = Cli::parse_from([
            "nsview",
            "--config",
            path.to_str().unwrap(),
            "--cache-dir",
            "/tmp/ns-cache",
            "browse",
        ]);
        let config = cli.dataset_config().unwrap();
        assert_eq!(config.url, "sqlite:///data/lake.db");
        assert_eq!(config.category, Category::Sweeps);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/ns-cache"));
        assert!(matches!(cli.command, Some(Mode::Browse { load: false })));
    }

    #[test]
    fn test_category_flag() {
        let cli = Cli::parse_from(["nsview", "--category", "sweeps", "--url", "/data/nuscenes"]);
        let config = cli.dataset_config().unwrap();
        assert_eq!(config.category, Category::Sweeps);
        assert_eq!(config.url, "/data/nuscenes");
        assert!(Cli::try_parse_from(["nsview", "--category", "keyframes"]).is_err());
    }

    #[test]
    fn test_mirror_then_browse_lake() {
        let dir = tempfile::tempdir().unwrap();
        let lidar = dir.path().join("tree/samples/LIDAR_TOP");
        let camera = dir.path().join("tree/samples/CAM_FRONT");
        std::fs::create_dir_all(&lidar).unwrap();
        std::fs::create_dir_all(&camera).unwrap();
        std::fs::write(lidar.join("n5__LIDAR_TOP__1.usd"), b"usd").unwrap();
        std::fs::write(camera.join("n5__CAM_FRONT__1.jpg"), b"jpg").unwrap();

        let db = dir.path().join("lake.db");
        mirror(&dir.path().join("tree"), &db).unwrap();

        let mut config = DatasetConfig::new(format!("sqlite://{}", db.display()));
        config.cache_dir = dir.path().join("cache");
        let source = load_dataset(&config, &SqliteLakeConnector, None).unwrap();
        let mut navigator = DatasetNavigator::new(source, config.category);
        assert!(navigator.checkout_dataset().unwrap());
        let uri = navigator.cam_front().unwrap().to_string();
        assert_eq!(std::fs::read(uri.strip_prefix("file://").unwrap()).unwrap(), b"jpg");
    }
}
