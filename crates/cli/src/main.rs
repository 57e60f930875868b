//! Administrative maintenance CLI for the content manager core service.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use cmsweep_core::{
    ApplicationDataCriteria, BatchCriteria, OldVersionsCriteria, ProcessHistoryCriteria,
    PublicationTargetCriteria, PublishTransactionCriteria, QueueCriteria, ReindexCriteria,
    SessionConfig, UndoPackageCriteria,
};
use cmsweep_purge::{AssumeYes, Confirm, PublishTransactionQuery, PurgePlan, execute, listing};
use cmsweep_service::{ByteStream, HttpConnector, Session};
use output::OutputFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Parser)]
#[command(name = "cmsweepctl")]
#[command(about = "Purge and retention maintenance for the content manager")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    session: SessionArgs,

    /// Skip the confirmation prompt
    #[arg(short, long, global = true, default_value_t = false)]
    force: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
struct SessionArgs {
    /// Core service host (overrides client config)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Core service port (overrides client config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Send/receive timeout in minutes (overrides client config)
    #[arg(long, global = true)]
    timeout: Option<u32>,

    /// Client config file path
    #[arg(long, global = true, env = config::CLIENT_CONFIG_ENV)]
    client_config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Purge artifacts from the core service
    Purge {
        #[command(subcommand)]
        command: PurgeCommands,
    },
    /// Decommission publication targets
    Decommission {
        /// Publication target ids
        #[arg(value_name = "TARGET_ID")]
        targets: Vec<String>,
    },
    /// Synchronize the search index (all repositories when none given)
    Reindex {
        /// Repository ids
        #[arg(value_name = "REPOSITORY_ID")]
        repositories: Vec<String>,
    },
    /// Read-only listings
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Write the content of an undo package to a file
    ExportUndoPackage {
        /// Undo package id
        id: String,
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check connectivity and show the service API version
    Version,
}

#[derive(Subcommand)]
enum PurgeCommands {
    /// Delete batches (only completed ones unless --all)
    Batches {
        /// Delete every batch, including unfinished ones
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Purge old versions of items in publications or folders
    OldVersions {
        /// Publication or organizational item (URI or WebDAV URL)
        #[arg(value_name = "CONTAINER")]
        containers: Vec<String>,
        /// Number of versions to keep per item
        #[arg(long)]
        versions_to_keep: Option<u32>,
        /// Keep versions modified after this date
        #[arg(long, value_parser = parse_date)]
        keep_after: Option<OffsetDateTime>,
        /// Keep versions within this many days before the last check-in
        #[arg(long)]
        keep_within_days: Option<u32>,
        /// Include nested organizational items
        #[arg(long, default_value_t = false)]
        recursive: bool,
        /// Maximum number of versioned items resolved per pass
        #[arg(long)]
        max_resolved: Option<u32>,
    },
    /// Purge workflow process histories
    ProcessHistories {
        /// Only histories finished before this date
        #[arg(long, value_parser = parse_date)]
        before: Option<OffsetDateTime>,
        /// Only histories of this publication (URI or WebDAV URL)
        #[arg(long)]
        publication: Option<String>,
    },
    /// Delete publish transactions
    PublishTransactions {
        /// Only transactions completed before this date
        #[arg(long, value_parser = parse_date)]
        before: Option<OffsetDateTime>,
        /// Only successful transactions
        #[arg(long, default_value_t = false)]
        successful: bool,
        /// Only failed transactions
        #[arg(long, default_value_t = false)]
        failed: bool,
    },
    /// Purge queue messages (all known queues when none given)
    Queues {
        /// Queue names, e.g. SearchQueue or search
        #[arg(value_name = "QUEUE")]
        queues: Vec<String>,
    },
    /// Delete undo packages
    UndoPackages {
        /// Undo package id
        #[arg(long)]
        id: Option<String>,
        /// Delete packages created before this date
        #[arg(long, value_parser = parse_local_datetime)]
        keep_after: Option<PrimitiveDateTime>,
    },
    /// Purge application data by application id
    ApplicationData {
        #[arg(value_name = "APPLICATION_ID")]
        application_ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Undo packages with their metadata
    UndoPackages,
    /// Publish transactions
    PublishTransactions {
        /// Show a single transaction
        #[arg(long)]
        id: Option<String>,
        /// Only transactions from this publisher host
        #[arg(long)]
        publisher_host: Option<String>,
        /// Only completed (true) or pending (false) transactions
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Message queues
    Queues,
    /// Repositories (all when none given)
    Repositories {
        #[arg(value_name = "REPOSITORY_ID")]
        ids: Vec<String>,
    },
    /// Application ids with stored data
    ApplicationIds,
}

impl PurgeCommands {
    fn into_plan(self) -> PurgePlan {
        match self {
            Self::Batches { all } => PurgePlan::Batches(BatchCriteria { all }),
            Self::OldVersions {
                containers,
                versions_to_keep,
                keep_after,
                keep_within_days,
                recursive,
                max_resolved,
            } => PurgePlan::OldVersions(OldVersionsCriteria {
                containers,
                versions_to_keep,
                keep_after,
                keep_within_days_before: keep_within_days,
                recursive,
                max_resolved_items: max_resolved,
            }),
            Self::ProcessHistories {
                before,
                publication,
            } => PurgePlan::ProcessHistories(ProcessHistoryCriteria {
                before,
                publication_id: publication,
            }),
            Self::PublishTransactions {
                before,
                successful,
                failed,
            } => PurgePlan::PublishTransactions(PublishTransactionCriteria {
                before,
                successful,
                failed,
            }),
            Self::Queues { queues } => PurgePlan::Queues(QueueCriteria { queues }),
            Self::UndoPackages { id, keep_after } => {
                PurgePlan::UndoPackages(UndoPackageCriteria {
                    package_id: id,
                    keep_after,
                })
            }
            Self::ApplicationData { application_ids } => {
                PurgePlan::ApplicationData(ApplicationDataCriteria { application_ids })
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        session: session_args,
        force,
        format,
        command,
        ..
    } = cli;

    let config = resolve_session_config(&session_args)?;
    let session = Session::acquire(config, Arc::new(HttpConnector));
    session
        .scoped(async move |session| dispatch(session, command, force, format).await)
        .await
}

fn resolve_session_config(args: &SessionArgs) -> Result<SessionConfig> {
    let path = config::client_config_path(args.client_config.as_deref())?;
    tracing::debug!(path = %path.display(), "Loading client config");
    let file = config::load_client_config(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(file.override_with(args.server.clone(), args.port, args.timeout))
}

async fn dispatch(
    session: &Session,
    command: Commands,
    force: bool,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Purge { command } => run_purge(session, command.into_plan(), force, format).await,
        Commands::Decommission { targets } => {
            let plan = PurgePlan::PublicationTargets(PublicationTargetCriteria {
                target_ids: targets,
            });
            run_purge(session, plan, force, format).await
        }
        Commands::Reindex { repositories } => {
            let plan = PurgePlan::SearchIndex(ReindexCriteria {
                repository_ids: repositories,
            });
            run_purge(session, plan, force, format).await
        }
        Commands::List { command } => run_list(session, command, format).await,
        Commands::ExportUndoPackage { id, output } => {
            let content = listing::open_undo_package(session, &id).await?;
            let written = write_export(content, &output).await?;
            tracing::info!(package_id = %id, bytes = written, "Exported undo package");
            println!("Exported {id} to {} ({written} bytes)", output.display());
            Ok(())
        }
        Commands::Version => {
            let version = session.version().await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "version": version }));
                }
                OutputFormat::Text => println!("Core service API version {version}"),
            }
            Ok(())
        }
    }
}

async fn run_purge(
    session: &Session,
    plan: PurgePlan,
    force: bool,
    format: OutputFormat,
) -> Result<()> {
    let confirm: &dyn Confirm = if force { &AssumeYes } else { &PromptConfirm };
    let outcome = execute(session, &plan, confirm).await?;
    output::print_outcome(&outcome, format)?;

    if !outcome.is_success() {
        anyhow::bail!(
            "{} of {} artifacts could not be purged",
            outcome.failures.len(),
            outcome.failures.len() + outcome.deleted.len()
        );
    }
    Ok(())
}

async fn run_list(session: &Session, command: ListCommands, format: OutputFormat) -> Result<()> {
    match command {
        ListCommands::UndoPackages => {
            let packages = listing::undo_packages(session).await?;
            output::print_undo_packages(&packages, format)
        }
        ListCommands::PublishTransactions {
            id: Some(id),
            publisher_host: _,
            completed: _,
        } => {
            let tx = listing::publish_transaction(session, &id).await?;
            output::print_transactions(std::slice::from_ref(&tx), format)
        }
        ListCommands::PublishTransactions {
            id: None,
            publisher_host,
            completed,
        } => {
            let query = PublishTransactionQuery {
                publisher_host,
                is_completed: completed,
            };
            let transactions = listing::publish_transactions(session, &query).await?;
            output::print_transactions(&transactions, format)
        }
        ListCommands::Queues => {
            let queues = listing::queues(session).await?;
            output::print_queues(&queues, format)
        }
        ListCommands::Repositories { ids } => {
            let repositories = listing::repositories(session, &ids).await?;
            output::print_repositories(&repositories, format)
        }
        ListCommands::ApplicationIds => {
            let ids = listing::application_ids(session).await?;
            output::print_lines(&ids, format)
        }
    }
}

/// Write the content to a sibling temp file and move it over `output` once complete.
async fn write_export(content: ByteStream, output: &Path) -> Result<u64> {
    let temp_path = partial_path(output);
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .with_context(|| format!("creating {}", temp_path.display()))?;

    let written = match listing::copy_content(content, &mut file).await {
        Ok(written) => written,
        Err(e) => {
            drop(file);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
    };
    drop(file);

    if let Err(e) = tokio::fs::rename(&temp_path, output).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e).with_context(|| format!("writing {}", output.display()));
    }
    Ok(written)
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "undo-package".to_string());
    output.with_file_name(format!(".{name}.partial-{}", std::process::id()))
}

/// Asks on the terminal. Anything but `y` declines.
struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, summary: &str) -> bool {
        eprint!("\nThis will purge: {summary}\n\nAre you sure? [y/N]: ");
        if std::io::stderr().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(_) => input.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
fn parse_date(value: &str) -> std::result::Result<OffsetDateTime, String> {
    let value = value.trim();
    if let Ok(at) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(at);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
        .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD or RFC 3339"))
}

/// Parse a date without offset, as stored in undo package metadata.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339 (converted to UTC).
fn parse_local_datetime(value: &str) -> std::result::Result<PrimitiveDateTime, String> {
    let value = value.trim();
    if let Ok(at) = OffsetDateTime::parse(value, &Rfc3339) {
        let utc = at.to_offset(UtcOffset::UTC);
        return Ok(PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    if let Ok(at) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(at);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|date| date.with_time(Time::MIDNIGHT))
        .map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::tempdir;
    use time::macros::datetime;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn with_env_lock<T>(action: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        action()
    }

    struct EnvVarGuard {
        key: &'static str,
        prev: Option<OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var_os(key);
            // SAFETY: callers hold ENV_LOCK
            unsafe { std::env::set_var(key, value) };
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var_os(key);
            // SAFETY: callers hold ENV_LOCK
            unsafe { std::env::remove_var(key) };
            Self { key, prev }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            // SAFETY: callers hold ENV_LOCK
            unsafe {
                if let Some(value) = self.prev.take() {
                    std::env::set_var(self.key, value);
                } else {
                    std::env::remove_var(self.key);
                }
            }
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn partial_path_is_a_sibling() {
        let path = partial_path(Path::new("/tmp/exports/pkg.bin"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/exports")));
        assert!(path.to_string_lossy().contains(".pkg.bin.partial-"));
    }

    #[test]
    fn parse_date_accepts_day_and_rfc3339() {
        assert_eq!(
            parse_date("2024-01-31").unwrap(),
            datetime!(2024-01-31 0:00 UTC)
        );
        assert_eq!(
            parse_date("2024-01-31T12:00:00+02:00").unwrap(),
            datetime!(2024-01-31 10:00 UTC)
        );
        assert!(parse_date("31/01/2024").is_err());
    }

    #[test]
    fn parse_local_datetime_variants() {
        assert_eq!(
            parse_local_datetime("2024-06-01").unwrap(),
            datetime!(2024-06-01 0:00)
        );
        assert_eq!(
            parse_local_datetime("2024-06-01T08:15:00").unwrap(),
            datetime!(2024-06-01 8:15)
        );
        assert_eq!(
            parse_local_datetime("2024-06-01T08:15:00Z").unwrap(),
            datetime!(2024-06-01 8:15)
        );
        assert!(parse_local_datetime("yesterday").is_err());
    }

    #[test]
    fn purge_arguments_map_to_criteria() {
        let cli = Cli::try_parse_from([
            "cmsweepctl",
            "purge",
            "old-versions",
            "tcm:0-5-1",
            "/webdav/100 Master",
            "--versions-to-keep",
            "0",
            "--keep-after",
            "2023-12-31",
            "--recursive",
        ])
        .unwrap();
        let Commands::Purge { command } = cli.command else {
            panic!("expected purge command");
        };
        let PurgePlan::OldVersions(criteria) = command.into_plan() else {
            panic!("expected old versions plan");
        };
        assert_eq!(criteria.containers.len(), 2);
        assert_eq!(criteria.versions_to_keep, Some(0));
        assert_eq!(criteria.keep_after, Some(datetime!(2023-12-31 0:00 UTC)));
        assert!(criteria.recursive);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cmsweepctl",
            "purge",
            "batches",
            "--all",
            "--force",
            "--server",
            "cms01",
            "--port",
            "8080",
            "--timeout",
            "3",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.force);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.session.server.as_deref(), Some("cms01"));
        assert_eq!(cli.session.port, Some(8080));
        assert_eq!(cli.session.timeout, Some(3));
    }

    #[test]
    fn client_config_path_respects_env() {
        with_env_lock(|| {
            let _guard = EnvVarGuard::set(config::CLIENT_CONFIG_ENV, "/tmp/cmsweep-client.toml");
            let path = config::client_config_path(None).unwrap();
            assert_eq!(path.to_string_lossy(), "/tmp/cmsweep-client.toml");

            let explicit = config::client_config_path(Some("/tmp/explicit.toml")).unwrap();
            assert_eq!(explicit.to_string_lossy(), "/tmp/explicit.toml");
        });
    }

    #[test]
    fn client_config_path_uses_xdg() {
        with_env_lock(|| {
            let temp = tempdir().unwrap();
            let _unset = EnvVarGuard::unset(config::CLIENT_CONFIG_ENV);
            let _guard = EnvVarGuard::set("XDG_CONFIG_HOME", temp.path().to_str().unwrap());
            let path = config::client_config_path(None).unwrap();
            assert_eq!(path, temp.path().join("cmsweep").join("client.toml"));
        });
    }

    #[test]
    fn load_client_config_missing_returns_default() {
        with_env_lock(|| {
            let temp = tempdir().unwrap();
            let _port = EnvVarGuard::unset("CMSWEEP_PORT");
            let _host = EnvVarGuard::unset("CMSWEEP_HOST");
            let config = config::load_client_config(&temp.path().join("missing.toml")).unwrap();
            assert_eq!(config.host(), "localhost");
            assert_eq!(config.port(), 2660);
        });
    }

    #[test]
    fn flags_override_file_and_env() {
        with_env_lock(|| {
            let temp = tempdir().unwrap();
            let path = temp.path().join("client.toml");
            std::fs::write(&path, "host = \"cms-file\"\nport = 9000\ntimeout_minutes = 5\n")
                .unwrap();
            let _port = EnvVarGuard::set("CMSWEEP_PORT", "9100");

            let args = SessionArgs {
                server: Some("cms-flag".to_string()),
                client_config: Some(path.to_string_lossy().into_owned()),
                ..Default::default()
            };
            let config = resolve_session_config(&args).unwrap();
            assert_eq!(config.host(), "cms-flag");
            assert_eq!(config.port(), 9100);
            assert_eq!(config.timeout_minutes, Some(5));
        });
    }
}
