//! coursegate: access layer demo CLI
//!
//! Drives the access decision service against a directory-backed store, so
//! state (session record, audit log) survives between invocations.
//!
//! Usage:
//!   cargo run -p demo -- login --subject learner-1 --role student
//!   cargo run -p demo -- guard --path /modules/intro
//!   cargo run -p demo -- check --role instructor --allow admin,moderator
//!   cargo run -p demo -- audit list --action role_check
//!   cargo run -p demo -- audit prune --days 30
//!   cargo run -p demo -- scenario

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coursegate_contracts::{
    access::{AccessRequest, GuardState},
    audit::AuditQuery,
    config::CoursegateConfig,
    error::CoursegateResult,
    role::Role,
};
use coursegate_core::{
    traits::{Clock, KeyValueStore},
    DisplayPreferences, JsonFileStore, SystemClock,
};
use coursegate_guard::AccessDecisionService;
use coursegate_session::ActivityContext;

mod scenario;

// ── CLI definition ────────────────────────────────────────────────────────────

/// coursegate: role and session access decisions for the learning portal.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "coursegate access layer demo",
    long_about = "Runs role checks, session validation, and audit-log maintenance\n\
                  against a local directory-backed store."
)]
struct Cli {
    /// Directory holding the persisted keys.
    #[arg(long, global = true, default_value = ".coursegate")]
    data_dir: PathBuf,

    /// Optional TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a session for a subject.
    Login {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        role: String,
    },
    /// End the current session.
    Logout,
    /// Run a single role check.
    Check {
        /// The actor's role; omit for an anonymous actor.
        #[arg(long)]
        role: Option<String>,
        /// Comma-separated allowed roles; omit for an unrestricted resource.
        #[arg(long, value_delimiter = ',')]
        allow: Vec<String>,
    },
    /// Evaluate the route guard for one navigation.
    Guard(GuardArgs),
    /// Inspect or maintain the audit log.
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Show the stored display preferences.
    Prefs,
    /// Run the end-to-end walkthrough in memory.
    Scenario,
}

#[derive(Args)]
struct GuardArgs {
    #[arg(long, default_value = "/")]
    path: String,
    #[arg(long, default_value = "Mozilla/5.0")]
    user_agent: String,
    /// Comma-separated roles the route requires.
    #[arg(long, value_delimiter = ',')]
    require: Vec<String>,
}

#[derive(Subcommand)]
enum AuditCommand {
    /// List entries matching the filters.
    List {
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        session: Option<String>,
        /// Only entries from the last N hours.
        #[arg(long)]
        since_hours: Option<i64>,
    },
    /// Remove entries older than N days.
    Prune {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Print the whole log as JSON.
    Export,
    /// Entry counts per action.
    Stats,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("coursegate error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> CoursegateResult<()> {
    let config = match &cli.config {
        Some(path) => CoursegateConfig::from_file(path)?,
        None => CoursegateConfig::default(),
    };

    match cli.command {
        Command::Scenario => scenario::run_scenario(config),
        command => run_stored(&cli.data_dir, config, command),
    }
}

fn run_stored(data_dir: &Path, config: CoursegateConfig, command: Command) -> CoursegateResult<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(data_dir)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    info!(data_dir = %data_dir.display(), "store opened");

    let service = AccessDecisionService::new(store.clone(), clock.clone(), config);
    service.sessions().resume()?;

    match command {
        Command::Login { subject, role } => {
            let record = service.sessions().login(subject, Role::parse(&role))?;
            println!("Logged in {} as {}", record.subject_id, record.role);
            println!("  token: {}", record.session_token);
        }
        Command::Logout => {
            service.sessions().logout()?;
            println!("Logged out.");
        }
        Command::Check { role, allow } => {
            let request = AccessRequest::new(role.as_deref().map(Role::parse), allow);
            let granted = service.decide(&request);
            println!(
                "{} → {}",
                describe_request(&request),
                if granted { "GRANTED" } else { "DENIED" }
            );
        }
        Command::Guard(args) => {
            let required: BTreeSet<Role> = args.require.iter().map(|r| Role::parse(r)).collect();
            let guard = service.route_guard_for(required);
            let state = guard.evaluate(&ActivityContext::new(args.path, args.user_agent));
            print_state(&state);
        }
        Command::Audit { command } => run_audit(&service, clock.as_ref(), command)?,
        Command::Prefs => {
            let prefs = DisplayPreferences::load(store.as_ref(), &service.config().display)?;
            println!("theme:      {}", prefs.theme);
            println!("animations: {}", prefs.animations_enabled);
            println!("sound:      {}", prefs.sound_enabled);
        }
        Command::Scenario => return scenario::run_scenario(service.config().clone()),
    }
    Ok(())
}

fn run_audit(
    service: &AccessDecisionService,
    clock: &dyn Clock,
    command: AuditCommand,
) -> CoursegateResult<()> {
    let log = service.audit_log();
    match command {
        AuditCommand::List {
            action,
            subject,
            session,
            since_hours,
        } => {
            let criteria = AuditQuery {
                action,
                subject_id: subject,
                session_id: session,
                from: since_hours.map(|h| clock.now() - chrono::Duration::hours(h)),
                to: None,
            };
            for entry in log.query(criteria) {
                println!(
                    "{}  {:<20} {:<28} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action,
                    entry.session_id,
                    serde_json::Value::Object(entry.payload)
                );
            }
        }
        AuditCommand::Prune { days } => {
            let removed = log.prune_older_than(days);
            println!("Removed {} entries older than {} days.", removed, days);
        }
        AuditCommand::Export => println!("{}", log.export_json()?),
        AuditCommand::Stats => {
            for (action, n) in log.counts_by_action() {
                println!("{:<24} {}", action, n);
            }
        }
    }
    Ok(())
}

// ── Output helpers ────────────────────────────────────────────────────────────

pub(crate) fn describe_request(request: &AccessRequest) -> String {
    let actor = request
        .actor_role
        .as_ref()
        .map(Role::to_string)
        .unwrap_or_else(|| "<anonymous>".to_string());
    let allowed: Vec<&str> = request.allowed_roles.iter().map(Role::as_str).collect();
    format!("{} on [{}]", actor, allowed.join(", "))
}

pub(crate) fn print_state(state: &GuardState) {
    match state.notice() {
        None => println!("  state: {:?}", state),
        Some(notice) => {
            println!("  state: {:?}", state);
            println!("  ┌ {}", notice.title);
            println!("  │ {}", notice.message);
            let exits: Vec<String> = state.exits().iter().map(|e| format!("{:?}", e)).collect();
            println!("  └ exits: {}", exits.join(" | "));
        }
    }
}
