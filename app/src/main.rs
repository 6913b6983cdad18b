use std::env;
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbnav_adapters::mysql::MysqlMetadataLoader;
use dbnav_adapters::static_loader::{demo_entries, demo_loader};
use dbnav_core::loader::MetadataLoader;
use dbnav_core::registry::{ConnectionRegistry, FileRegistry, RegistryEntry};
use dbnav_core::settings::{config_dir, Settings};
use dbnav_tui::{RunOptions, RunOutcome, TuiError};

const LOG_FILE: &str = "dbnav.log";

const USAGE: &str = "\
Usage: dbnav [--demo] [--config-dir <path>]

Browse databases, schemas, tables and columns of the connections listed in
connections.toml.

Options:
  --demo               browse a built-in sample catalog instead
  --config-dir <path>  read connections.toml and settings.toml from <path>
  -h, --help           print this help

Environment:
  DBNAV_CONFIG_DIR     default for --config-dir
  DBNAV_DB_PASSWORD    password for profiles using the env_var source
  RUST_LOG             log filter for dbnav.log (default: info)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CliArgs {
    demo: bool,
    config_dir: Option<PathBuf>,
    help: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum CliError {
    #[error("`{0}` needs a value")]
    MissingValue(&'static str),
    #[error("unknown argument `{0}`; see --help")]
    UnknownArgument(String),
    #[error("no config directory for this platform; pass --config-dir")]
    ConfigDirUnavailable,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, CliError> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => parsed.demo = true,
            "-h" | "--help" => parsed.help = true,
            "--config-dir" => {
                let value = args.next().ok_or(CliError::MissingValue("--config-dir"))?;
                parsed.config_dir = Some(PathBuf::from(value));
            }
            other => match other.strip_prefix("--config-dir=") {
                Some(value) if !value.is_empty() => {
                    parsed.config_dir = Some(PathBuf::from(value));
                }
                Some(_) => return Err(CliError::MissingValue("--config-dir")),
                None => return Err(CliError::UnknownArgument(other.to_string())),
            },
        }
    }
    Ok(parsed)
}

fn resolve_config_dir(args: &CliArgs) -> Result<PathBuf, CliError> {
    match &args.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => config_dir().ok_or(CliError::ConfigDirUnavailable),
    }
}

/// Logs go to a file; stderr belongs to the alternate screen while the UI runs.
fn init_logging(dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(path)
}

struct Session {
    entries: Vec<RegistryEntry>,
    loader: Arc<dyn MetadataLoader>,
}

fn prepare_session(args: &CliArgs, dir: &Path) -> Result<Session, Box<dyn Error>> {
    if args.demo {
        log::info!("demo mode: serving the built-in catalog");
        return Ok(Session {
            entries: demo_entries(),
            loader: Arc::new(demo_loader()),
        });
    }

    let registry = FileRegistry::load_from_dir(dir)?;
    log::info!(
        "{} connection(s) configured in {}",
        registry.profiles().len(),
        registry.path().display()
    );
    Ok(Session {
        entries: registry.get_all(),
        loader: Arc::new(MysqlMetadataLoader::new(registry.profiles().to_vec())),
    })
}

fn run_app(
    args: &CliArgs,
    dir: &Path,
    run_tui: impl FnOnce(RunOptions) -> Result<RunOutcome, TuiError>,
) -> Result<Option<String>, Box<dyn Error>> {
    let settings = Settings::load_from_dir(dir)?;
    let session = prepare_session(args, dir)?;
    let outcome = run_tui(RunOptions {
        entries: session.entries,
        loader: session.loader,
        settings,
    })?;
    log::info!("session ended");
    Ok(outcome.last_selected)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args(env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let dir = resolve_config_dir(&args)?;
    init_logging(&dir)?;
    if let Some(selected) = run_app(&args, &dir, dbnav_tui::run)? {
        println!("{selected}");
    }
    Ok(())
}
