use anyhow::Result;
use clap::Parser;
use relaybin::commands::{InstallOptions, RunOptions, install, run};
use relaybin::config::{
    DEFAULT_BINARY_NAME, DEFAULT_OWNER, DEFAULT_RELEASE_HOST, DEFAULT_REPO, FetchConfig,
    ReleaseSource,
};
use relaybin::error::LaunchError;
use relaybin::launcher::{reinstall_hint, terminate};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// relaybin - prebuilt binary installer and launcher
///
/// Downloads the release binary matching this machine and runs it with
/// inherited stdio, relaying signals and propagating its exit.
///
/// Proxies are taken from HTTPS_PROXY / HTTP_PROXY when set.
///
/// Examples:
///   relaybin install                 # Install the version named in ./package.json
///   relaybin run --port 8080         # Run the installed binary
///   relaybin --dir ~/bin install     # Options go before the subcommand
#[derive(Parser, Debug)]
#[command(author, version = env!("RELAYBIN_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install directory (overrides the default; also via RELAYBIN_DIR)
    #[arg(long = "dir", env = "RELAYBIN_DIR", value_name = "PATH")]
    pub install_dir: Option<PathBuf>,

    /// Base name of the released binary
    #[arg(
        long = "binary-name",
        env = "RELAYBIN_BINARY_NAME",
        value_name = "NAME",
        default_value = DEFAULT_BINARY_NAME
    )]
    pub binary_name: String,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download the binary for this platform
    Install(InstallArgs),

    /// Run the installed binary, forwarding all arguments
    ///
    /// Everything after `run` belongs to the binary, `--help` included.
    #[command(disable_help_flag = true)]
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Release version to install (defaults to the manifest's version)
    #[arg(long, env = "RELAYBIN_RELEASE_VERSION", value_name = "VERSION")]
    pub release_version: Option<String>,

    /// Package manifest providing the version
    #[arg(long, value_name = "PATH", default_value = "package.json")]
    pub manifest: PathBuf,

    /// Release host
    #[arg(long, env = "RELAYBIN_RELEASE_HOST", value_name = "URL", default_value = DEFAULT_RELEASE_HOST)]
    pub release_host: String,

    /// Repository owner
    #[arg(long, env = "RELAYBIN_OWNER", default_value = DEFAULT_OWNER)]
    pub owner: String,

    /// Repository name
    #[arg(long, env = "RELAYBIN_REPO", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Per-attempt timeout in milliseconds
    #[arg(long, env = "RELAYBIN_TIMEOUT_MS", value_name = "MS", default_value_t = 180_000)]
    pub timeout_ms: u64,

    /// Total number of download attempts
    #[arg(long, env = "RELAYBIN_MAX_RETRIES", value_name = "N", default_value_t = 3)]
    pub max_retries: usize,

    /// Delay between attempts in milliseconds
    #[arg(long, env = "RELAYBIN_RETRY_DELAY_MS", value_name = "MS", default_value_t = 2_000)]
    pub retry_delay_ms: u64,
}

impl InstallArgs {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_retries: self.max_retries,
            timeout: Duration::from_millis(self.timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..FetchConfig::default()
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Arguments passed to the binary
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<OsString>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = relaybin::runtime::RealRuntime;

    match cli.command {
        Commands::Install(args) => {
            let fetch = args.fetch_config();
            let options = InstallOptions {
                install_dir: cli.install_dir,
                release_version: args.release_version,
                manifest: args.manifest,
                binary_name: cli.binary_name,
                source: ReleaseSource {
                    host: args.release_host,
                    owner: args.owner,
                    repo: args.repo,
                },
                fetch,
            };
            install(runtime, options).await?;
        }
        Commands::Run(args) => {
            let options = RunOptions {
                install_dir: cli.install_dir,
                binary_name: cli.binary_name,
                args: args.args,
            };
            match run(runtime, options).await {
                Ok(outcome) => terminate(outcome),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    if let Some(LaunchError::BinaryNotFound { path }) = e.downcast_ref() {
                        eprintln!("\n{}", reinstall_hint(path));
                    }
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
