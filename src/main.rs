use anyhow::{Context, Result};
use clap::Parser;
use resourcepack_builder::archive::{self, DEFAULT_BASE_PACK_SEARCH_PATHS};
use resourcepack_builder::builder::{BuildOptions, BuildOutcome, build_pack};
use resourcepack_builder::codegen::generate_java_constants;
use resourcepack_builder::pack_config::{DEFAULT_PACK_CONFIG, PackConfig};
use resourcepack_builder::plugin_config::update_plugin_config;
use resourcepack_builder::properties::update_server_properties;
use resourcepack_builder::publish::{GithubRelease, HostUploader, verify_remote};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "resourcepack-builder")]
#[command(author, version, about = "Build, publish and wire up the Bitter Harvest resource pack", long_about = None)]
struct Cli {
    /// ModelEngine pack to merge (.zip or directory); auto-detected when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the finished pack
    #[arg(short, long, default_value = "bitter-harvest-pack.zip")]
    output: PathBuf,

    /// Folder with custom background PNGs
    #[arg(long, default_value = "my_art")]
    art: PathBuf,

    /// Write GeneratedBackgrounds.java here
    #[arg(long)]
    java_output: Option<PathBuf>,

    /// Upload the pack (GitHub Releases unless --host is given)
    #[arg(short, long)]
    publish: bool,

    /// Publish to anonymous file hosts (0x0.st, then file.io) instead of GitHub
    #[arg(long)]
    host: bool,

    /// Git repository the GitHub release is created from
    #[arg(long, default_value = ".")]
    repo_dir: PathBuf,

    /// Download the published pack and check its SHA-1
    #[arg(long)]
    verify_upload: bool,

    /// Update server.properties and the plugin config.yml
    #[arg(short, long)]
    update_config: bool,

    /// Plugin config.yml path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// server.properties path
    #[arg(short = 'P', long)]
    properties_path: Option<PathBuf>,

    /// Build, publish and update configs
    #[arg(short, long)]
    auto: bool,

    /// Skip merging the ModelEngine pack
    #[arg(short, long)]
    standalone: bool,

    /// Use this URL instead of uploading, then update configs
    #[arg(long)]
    url: Option<String>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_PACK_CONFIG)]
    settings: PathBuf,

    /// Write the current settings to the settings file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = PackConfig::load(&cli.settings)
        .with_context(|| format!("failed to load {}", cli.settings.display()))?;

    if cli.init {
        settings.save(&cli.settings)?;
        println!("Settings written to {}", cli.settings.display());
        return Ok(());
    }

    let publish = cli.publish || cli.auto || settings.auto_publish;
    let update_config = cli.update_config || cli.auto || settings.auto_update_config;

    let base_pack = if cli.standalone {
        None
    } else if let Some(input) = &cli.input {
        Some(input.clone())
    } else {
        info!("auto-detecting ModelEngine pack");
        let candidates = settings
            .modelengine_pack()
            .into_iter()
            .chain(DEFAULT_BASE_PACK_SEARCH_PATHS.into_iter().map(PathBuf::from));
        let found = archive::find_base_pack(candidates);
        match &found {
            Some(path) => info!(path = %path.display(), "found ModelEngine pack"),
            None => warn!("ModelEngine pack not found, building standalone pack"),
        }
        found
    };

    let mut options = BuildOptions::new(&cli.output);
    options.base_pack = base_pack;
    options.art_dir = Some(cli.art.clone());

    let outcome = build_pack(&options).context("pack build failed")?;

    if let Some(java_output) = &cli.java_output {
        generate_java_constants(&outcome.backgrounds, &outcome.sha1, java_output)
            .with_context(|| format!("failed to write {}", java_output.display()))?;
    }

    let mut url = cli.url.clone();
    if url.is_none() && publish {
        let published = if cli.host {
            HostUploader::new()?.upload_auto(&outcome.archive).await
        } else {
            GithubRelease::new(&cli.repo_dir).publish(&outcome.archive, &outcome.sha1).await
        };
        match published {
            Ok(u) => url = Some(u),
            Err(e) => warn!(error = %e, "publish failed"),
        }
    }

    if let Some(url) = &url {
        if cli.verify_upload {
            verify_remote(url, &outcome.sha1)
                .await
                .with_context(|| format!("published pack at {url} does not match the local build"))?;
        }
        update_configs(&cli, &settings, publish, update_config, url, &outcome.sha1)?;
    }

    print_summary(&outcome, url.as_deref());
    Ok(())
}

fn update_configs(
    cli: &Cli,
    settings: &PackConfig,
    publish: bool,
    update_config: bool,
    url: &str,
    sha1: &str,
) -> Result<()> {
    if publish || update_config {
        let props = cli.properties_path.clone().or_else(|| settings.server_properties_path());
        match props {
            Some(path) if path.is_file() => {
                update_server_properties(&path, url, sha1)
                    .with_context(|| format!("failed to update {}", path.display()))?;
            }
            Some(path) => warn!(path = %path.display(), "server.properties not found"),
            None => {}
        }
    }

    if update_config {
        let config = cli.config_path.clone().or_else(|| settings.server_config_path());
        match config {
            Some(path) if path.is_file() => {
                update_plugin_config(&path, url, sha1)
                    .with_context(|| format!("failed to update {}", path.display()))?;
            }
            Some(path) => warn!(path = %path.display(), "plugin config not found"),
            None => {}
        }
    }
    Ok(())
}

fn print_summary(outcome: &BuildOutcome, url: Option<&str>) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  BUILD COMPLETE!");
    println!("{}", "=".repeat(60));
    println!();
    println!("  Pack:   {}", outcome.archive.display());
    println!("  SHA-1:  {}", outcome.sha1);
    match url {
        Some(url) => {
            println!("  URL:    {url}");
            println!();
            println!("  Server will use new pack on next player join!");
        }
        None => {
            println!();
            println!("  Next: Upload pack and update config.yml with URL + SHA-1");
        }
    }
}
