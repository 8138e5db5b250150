use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orgmirror::listing::load_projects;
use orgmirror::preflight::check_org_dirs;
use orgmirror::{
    delete_orphans, find_orphans, Config, GitRunner, HttpListing, Preflight, Report, RunStatus,
    SyncContext, SyncScheduler,
};

#[derive(Parser)]
#[command(name = "orgmirror")]
#[command(about = "Concurrent local mirror of organization git repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync every listed repository (the default command)
    Sync {
        /// Worker count (defaults to the number of processor cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Clone with submodule recursion
        #[arg(long)]
        recurse_submodules: bool,

        /// Allow creating missing organization directories
        #[arg(long)]
        create_org_dirs: bool,

        /// Organization to ignore (repeatable, adds to the configured set)
        #[arg(long = "ignore", value_name = "ORG")]
        ignore_orgs: Vec<String>,

        /// Listing endpoint override
        #[arg(long)]
        url: Option<String>,
    },

    /// Detect local directories with no upstream repository
    Orphans {
        /// Delete the orphaned directories instead of only listing them
        #[arg(long)]
        delete: bool,
    },

    /// List the repositories the current listing would sync
    List {
        /// Filter by organization
        #[arg(long)]
        org: Option<String>,
    },

    /// Environment diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = match cli.config {
        Some(path) => Config::load(&path)?,
        None => Config::load_or_default()?,
    };

    match cli.command {
        None => {
            cmd_sync(config, None, false, false, Vec::new(), None).await
        }
        Some(Commands::Sync {
            jobs,
            recurse_submodules,
            create_org_dirs,
            ignore_orgs,
            url,
        }) => cmd_sync(config, jobs, recurse_submodules, create_org_dirs, ignore_orgs, url).await,
        Some(Commands::Orphans { delete }) => cmd_orphans(config, delete).await,
        Some(Commands::List { org }) => cmd_list(config, org).await,
        Some(Commands::Doctor) => cmd_doctor(config),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Fetch the listing, reconcile orphans, and drain the sync queue.
async fn cmd_sync(
    mut config: Config,
    jobs: Option<usize>,
    recurse_submodules: bool,
    create_org_dirs: bool,
    ignore_orgs: Vec<String>,
    url: Option<String>,
) -> Result<()> {
    if jobs.is_some() {
        config.sync.jobs = jobs;
    }
    if recurse_submodules {
        config.sync.recurse_submodules = true;
    }
    if create_org_dirs {
        config.sync.create_org_dirs = true;
    }
    config.ignore_orgs.extend(ignore_orgs);
    if let Some(url) = url {
        config.listing.url = url;
    }

    let root = Path::new(&config.mirror_root);
    if !root.is_dir() {
        bail!(
            "mirror root {} does not exist; create it or fix mirror_root in the config",
            root.display()
        );
    }

    let source = HttpListing::new(config.listing.url.clone());
    let projects = load_projects(&source, &config).await?;
    info!("listing holds {} repositories", projects.len());

    // Guard against cloning everything into a misconfigured location.
    check_org_dirs(&projects, &config)?;

    let report = Report::new();
    report.set_orphans(find_orphans(&projects, root)?);

    let ctx = Arc::new(SyncContext {
        root: root.to_path_buf(),
        git: GitRunner::new(config.git_timeout()),
        ignore_orgs: config.ignore_orgs.iter().cloned().collect(),
        report: report.clone(),
    });

    let scheduler = SyncScheduler::new(config.jobs());

    let cancel = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, letting in-flight git operations finish");
            cancel.cancel();
        }
    });

    let outcome = scheduler.run(projects, ctx).await;

    // The report prints even when a worker fault or an interrupt cut the run
    // short, so partial progress is never lost.
    report.print();

    match outcome? {
        RunStatus::Drained => info!("sync complete"),
        RunStatus::Cancelled => warn!("sync interrupted, report reflects partial progress"),
    }

    Ok(())
}

/// List orphaned directories; with `--delete`, remove them and exit.
/// No cloning or fetching happens in this mode.
async fn cmd_orphans(config: Config, delete: bool) -> Result<()> {
    let root = Path::new(&config.mirror_root);
    if !root.is_dir() {
        bail!("mirror root {} does not exist", root.display());
    }

    let source = HttpListing::new(config.listing.url.clone());
    let projects = load_projects(&source, &config).await?;

    let orphans = find_orphans(&projects, root)?;

    if orphans.is_empty() {
        info!("no orphaned directories found");
        return Ok(());
    }

    let report = Report::new();
    report.set_orphans(orphans.clone());
    report.print();

    if delete {
        delete_orphans(&orphans)?;
        info!("deleted {} orphaned directories", orphans.len());
    }

    Ok(())
}

/// List the repositories the listing would sync
async fn cmd_list(config: Config, org_filter: Option<String>) -> Result<()> {
    let source = HttpListing::new(config.listing.url.clone());
    let projects = load_projects(&source, &config).await?;

    let filtered: Vec<_> = match &org_filter {
        Some(org) => projects.into_iter().filter(|p| &p.org == org).collect(),
        None => projects,
    };

    println!("Repositories ({}):", filtered.len());
    for project in &filtered {
        println!("  {} <- {}", project.full_name(), project.git_uri);
    }

    Ok(())
}

/// Environment diagnostics
fn cmd_doctor(config: Config) -> Result<()> {
    let preflight = Preflight::run(&config);

    println!("orgmirror diagnostics");
    println!();
    for (name, result) in preflight.all_checks() {
        let icon = if result.passed { "ok" } else { "FAILED" };
        println!("{}: {} - {}", name, icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("   {}", line);
            }
        }
    }
    println!();

    if preflight.all_passed() {
        println!("All checks passed");
        Ok(())
    } else {
        bail!("some checks failed");
    }
}
