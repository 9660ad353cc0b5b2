use std::{
    env,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::{Context as _, anyhow};
use billpilot_core::{BillingAdmin, BillingService, ProcessorClient, SandboxProcessor};
use billpilot_driver_stripe::{API_BASE_ENV, API_KEY_ENV, StripeConfig, StripeProcessor};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod manifest;
mod output;

use manifest::{LoadManifestError, Manifest};
use output::OutputFormat;

/// Everything a command needs to talk to the processor
pub struct Context {
    pub service: BillingService,
    pub admin: BillingAdmin,
    /// Set when talking to the hosted processor
    pub stripe: Option<Arc<StripeProcessor>>,
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Billpilot - customer billing on top of Stripe", long_about = None)]
struct Opts {
    /// Path to the billpilot.yaml manifest file
    #[arg(
        long = "manifest-path",
        short = 'm',
        global = true,
        default_value = "./billpilot.yaml"
    )]
    manifest_path: PathBuf,

    /// Use the in-memory sandbox processor instead of Stripe; state lasts for this run only
    #[arg(long = "sandbox", short = 's', global = true, default_value = "false")]
    sandbox: bool,

    /// Stripe API secret key. If not provided, will check STRIPE_SECRET_KEY env var or the manifest
    #[arg(long = "api-key", short = 'k', global = true)]
    api_key: Option<String>,

    /// Output format: json or pretty
    #[arg(long = "format", short = 'f', global = true, default_value = "pretty")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Customer records
    Customers {
        #[clap(subcommand)]
        command: commands::CustomersCommand,
    },
    /// Default payment sources
    Sources {
        #[clap(subcommand)]
        command: commands::SourcesCommand,
    },
    /// Subscriptions
    Subscriptions {
        #[clap(subcommand)]
        command: commands::SubscriptionsCommand,
    },
    /// Invoices
    Invoices {
        #[clap(subcommand)]
        command: commands::InvoicesCommand,
    },
    /// Charges
    Charges {
        #[clap(subcommand)]
        command: commands::ChargesCommand,
    },
    /// Coupons
    Coupons {
        #[clap(subcommand)]
        command: commands::CouponsCommand,
    },
    /// Environment reset for test accounts
    Admin {
        #[clap(subcommand)]
        command: commands::AdminCommand,
    },
    /// Show the Stripe account behind the configured key
    Account,
    /// Run a full billing round trip and clean up after it
    Smoke(commands::SmokeCommand),
}

#[tokio::main]
async fn main() {
    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    init_tracing();

    // Get the directory containing the manifest file
    let manifest_dir = opts
        .manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    load_env_file(&manifest_dir);

    let manifest = match Manifest::load(&opts.manifest_path) {
        Ok(manifest) => {
            tracing::debug!(path = %opts.manifest_path.display(), "Loaded manifest");
            manifest
        }
        Err(LoadManifestError::FileNotFound(_)) => Manifest::default(),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let ctx = match build_context(&opts, &manifest) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = handle_command(opts.command, &ctx).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays machine readable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load environment variables from .env file in the manifest directory
fn load_env_file(manifest_dir: &Path) {
    let env_file_path = manifest_dir.join(".env");

    match dotenvy::from_path(&env_file_path) {
        Ok(_) => {
            tracing::debug!(path = %env_file_path.display(), "Loaded environment");
        }
        Err(e) if e.not_found() => {}
        Err(e) => {
            tracing::warn!(
                path = %env_file_path.display(),
                error = %e,
                "Failed to load .env file"
            );
        }
    }
}

/// Resolve the Stripe connection with priority: flag, then environment, then manifest
fn resolve_stripe_config(opts: &Opts, manifest: &Manifest) -> anyhow::Result<StripeConfig> {
    let api_key = match &opts.api_key {
        Some(key) => key.clone(),
        None => match env::var(API_KEY_ENV) {
            Ok(key) => key,
            Err(_) => manifest.stripe.api_key.clone().ok_or_else(|| {
                anyhow!(
                    "Stripe API key not found. Please provide --api-key, set {} or configure stripe.api_key in {}",
                    API_KEY_ENV,
                    opts.manifest_path.display()
                )
            })?,
        },
    };

    let mut config = StripeConfig::new(api_key);
    config.api_base = env::var(API_BASE_ENV)
        .ok()
        .or_else(|| manifest.stripe.api_base.clone());
    config.validate()?;
    Ok(config)
}

fn build_context(opts: &Opts, manifest: &Manifest) -> anyhow::Result<Context> {
    let mut stripe: Option<Arc<StripeProcessor>> = None;
    let processor: Arc<dyn ProcessorClient> = if opts.sandbox {
        tracing::info!("Using in-memory sandbox processor");
        Arc::new(SandboxProcessor::new(manifest.sandbox.clone()))
    } else {
        let config = resolve_stripe_config(opts, manifest)
            .context("Could not configure the Stripe processor")?;
        if !config.is_test_mode() {
            tracing::warn!("Using a live-mode Stripe key");
        }
        let processor = Arc::new(StripeProcessor::new(config));
        stripe = Some(processor.clone());
        processor
    };

    Ok(Context {
        service: BillingService::new(processor.clone()).with_config(manifest.billing.clone()),
        admin: BillingAdmin::new(processor),
        stripe,
        format: opts.format,
    })
}

async fn handle_command(command: Command, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Command::Customers { command } => command.execute(ctx).await,
        Command::Sources { command } => command.execute(ctx).await,
        Command::Subscriptions { command } => command.execute(ctx).await,
        Command::Invoices { command } => command.execute(ctx).await,
        Command::Charges { command } => command.execute(ctx).await,
        Command::Coupons { command } => command.execute(ctx).await,
        Command::Admin { command } => command.execute(ctx).await,
        Command::Account => commands::show_account(ctx).await,
        Command::Smoke(cmd) => cmd.execute(ctx).await,
    }
}
