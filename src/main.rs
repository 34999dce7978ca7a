use anyhow::Result;
use clap::Parser;
use plpm::commands::{
    self,
    config::{Config, Options},
};
use plpm::forge::{InvalidPackageRef, PackageRef, validate_segment};
use std::path::PathBuf;

/// plpm - Prolog package manager
///
/// Installs Prolog packages from git repositories tagged `V<major>.<minor>.<patch>`,
/// resolves their dependencies, and keeps the Prolog search path in sync.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for accessing private repositories or avoiding rate limits.
///
/// Examples:
///   plpm install alice foo          # Install the latest version of alice/foo
///   plpm install alice foo 1.2.0    # Install exactly V1.2.0
///   plpm updates                    # Show what would be updated
#[derive(Parser, Debug)]
#[command(author, version = env!("PLPM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install root directory (overrides defaults; also via PLPM_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "PLPM_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub install_root: Option<PathBuf>,

    /// GitHub API URL used to list tags (defaults to https://api.github.com)
    #[arg(long = "api-url", env = "PLPM_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Base URL packages are cloned from (defaults to https://github.com)
    #[arg(long = "git-url", env = "PLPM_GIT_URL", value_name = "URL", global = true)]
    pub git_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install a package and its dependencies
    Install(InstallArgs),

    /// Update a package, or every outdated package
    Update(UpdateArgs),

    /// Remove an installed package
    Remove(PackageArgs),

    /// List installed packages
    List,

    /// Show installed packages that have a newer version
    Updates,

    /// Rewrite the search path file from the installed packages
    Sync,
}

fn segment(value: &str) -> Result<String, InvalidPackageRef> {
    validate_segment(value).map(str::to_string)
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    /// Repository owner
    #[arg(value_parser = segment)]
    pub owner: String,
    /// Repository name
    #[arg(value_parser = segment)]
    pub repo: String,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Repository owner
    #[arg(value_parser = segment)]
    pub owner: String,
    /// Repository name
    #[arg(value_parser = segment)]
    pub repo: String,
    /// Exact version to install, e.g. 1.2.0 or V1.2.0
    pub version: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Repository owner (omit to update everything outdated)
    #[arg(requires = "repo", value_parser = segment)]
    pub owner: Option<String>,
    /// Repository name
    #[arg(value_parser = segment)]
    pub repo: Option<String>,
}

impl UpdateArgs {
    fn package(&self) -> Option<PackageRef> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Some(PackageRef::new(owner.as_str(), repo.as_str())),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let options = Options {
        install_root: cli.install_root,
        api_url: cli.api_url,
        git_url: cli.git_url,
    };
    let config = Config::new(plpm::runtime::RealRuntime, options)?;

    match cli.command {
        Commands::Install(args) => {
            commands::install(&config, &args.owner, &args.repo, args.version.as_deref()).await?
        }
        Commands::Update(args) => commands::update(&config, args.package()).await?,
        Commands::Remove(args) => {
            commands::remove(&config, &PackageRef::new(args.owner, args.repo)).await?
        }
        Commands::List => commands::list(&config).await?,
        Commands::Updates => commands::updates(&config).await?,
        Commands::Sync => commands::sync(&config).await?,
    }
    Ok(())
}
