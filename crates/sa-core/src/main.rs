//! seqaudit - sequential group auditing of report streams
//!
//! The main entry point, handling:
//! - Audits of a report stream against per-group base rates
//! - Permuted multi-trial evaluation against the offline oracle
//! - Configuration inspection and validation

use clap::{Args, Parser, Subcommand};
use sa_common::{format_error_human, ErrorCategory, OutputFormat, Result, StructuredError};
use sa_config::{
    get_preset, load_config, validate_config, AuditConfig, ConfigError, LambdaRule, Method,
    PresetName, CONFIG_SCHEMA_VERSION,
};
use sa_core::exit_codes::ExitCode;
use sa_core::input::InputBundle;
use sa_core::log_event;
use sa_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use sa_core::matcher::GroupMatcher;
use sa_core::oracle::{flagged_groups, oracle_report};
use sa_core::output::{OracleReport, Render, RunReport, TrialReport, OUTPUT_SCHEMA_VERSION};
use sa_core::trial::{run_trials, summarize, TrialAlgorithm, TrialConfig};
use sa_core::{drive, AuditRun};
use std::io::IsTerminal;
use std::path::PathBuf;

/// seqaudit - anytime-valid auditing of subgroup report rates
#[derive(Parser)]
#[command(name = "seqaudit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to an audit config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a report stream and print the rejection table
    Run(RunArgs),
    /// Run the audit over permuted streams and score it against the oracle
    Trial(TrialArgs),
    /// Print ground-truth report rates over the whole stream
    Oracle(OracleArgs),
    /// Configuration management
    Config(ConfigArgs),
    /// Print version information
    Version,
}

/// The three input files.
#[derive(Args, Debug)]
struct InputArgs {
    /// JSON array of report objects, in stream order
    #[arg(long)]
    reports: PathBuf,

    /// JSON array of group objects (feature -> required value)
    #[arg(long)]
    groups: PathBuf,

    /// JSON array of base rates, one per group
    #[arg(long)]
    base_rates: PathBuf,
}

impl InputArgs {
    fn load(&self, ctx: &LogContext) -> Result<InputBundle> {
        let bundle = InputBundle::load(&self.reports, &self.groups, &self.base_rates)?;
        log_event!(
            ctx,
            INFO,
            event_names::INPUT_LOADED,
            Stage::Load,
            "Inputs loaded",
            reports = bundle.reports.len(),
            groups = bundle.groups.len()
        );
        Ok(bundle)
    }
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args, Debug, Default)]
struct AuditOverrides {
    /// Start from a named preset instead of the config file
    #[arg(long)]
    preset: Option<PresetName>,

    /// Test procedure
    #[arg(long, value_enum)]
    method: Option<Method>,

    /// Betting-fraction estimator for the e-process
    #[arg(long, value_enum)]
    lambda_rule: Option<LambdaRule>,

    /// Use the variance-scaled LIL boundary
    #[arg(long)]
    asymptotic: bool,

    /// Family-wise false-alarm level
    #[arg(long)]
    alpha: Option<f64>,

    /// Null multiplier on base rates
    #[arg(long)]
    beta: Option<f64>,

    /// Maximum number of reports consumed
    #[arg(long)]
    max_iter: Option<u64>,

    /// Stop at the first alarm and report a single group
    #[arg(long)]
    first_alarm: bool,
}

impl AuditOverrides {
    fn apply(&self, base: AuditConfig) -> AuditConfig {
        let mut config = match self.preset {
            Some(preset) => get_preset(preset),
            None => base,
        };
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(rule) = self.lambda_rule {
            config.lambda_rule = rule;
        }
        if self.asymptotic {
            config.asymptotic = true;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.beta = beta;
        }
        if let Some(max_iter) = self.max_iter {
            config.max_iter = max_iter;
        }
        if self.first_alarm {
            config.stop_at_first = true;
        }
        config
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    overrides: AuditOverrides,
}

#[derive(Args, Debug)]
struct TrialArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    overrides: AuditOverrides,

    /// Number of permuted trials
    #[arg(long, default_value_t = 10)]
    trials: usize,

    /// Comma-separated alpha levels (defaults to the configured alpha)
    #[arg(long, value_delimiter = ',')]
    alphas: Vec<f64>,

    /// Comma-separated algorithms: eval, eval-agrapa, sprt, lil, lil-asymptotic
    #[arg(long, value_delimiter = ',')]
    algorithms: Vec<TrialAlgorithm>,

    /// Seed multiplier for trial permutations (defaults to max_iter)
    #[arg(long)]
    seed_base: Option<u64>,
}

#[derive(Args, Debug)]
struct OracleArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Null multiplier on base rates (defaults to the configured beta)
    #[arg(long)]
    beta: Option<f64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show {
        /// Show a preset instead of the resolved config
        #[arg(long)]
        preset: Option<PresetName>,
    },
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
    /// Print JSON schema for the configuration file
    Schema,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };

    // Machine-readable payloads get machine-readable logs unless the
    // environment says otherwise
    let mut log_config = LogConfig::from_env(cli_level, None);
    if std::env::var(sa_core::logging::config::ENV_LOG_FORMAT).is_err()
        && matches!(cli.global.format, OutputFormat::Json | OutputFormat::Jsonl)
    {
        log_config = log_config.with_format(LogFormat::Jsonl);
    }
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    let (stage, result) = match &cli.command {
        Commands::Run(args) => (Stage::Audit, run_audit_command(&cli.global, args, &ctx)),
        Commands::Trial(args) => (Stage::Trial, run_trial_command(&cli.global, args, &ctx)),
        Commands::Oracle(args) => (Stage::Oracle, run_oracle_command(&cli.global, args, &ctx)),
        Commands::Config(args) => (Stage::Init, run_config(&cli.global, args, &ctx)),
        Commands::Version => {
            print_version(&cli.global);
            (Stage::Init, Ok(ExitCode::Clean))
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => output_error(&cli.global, &ctx, stage, &e),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

/// Load the config file and apply command-line overrides.
fn effective_config(
    global: &GlobalOpts,
    overrides: &AuditOverrides,
    ctx: &LogContext,
) -> Result<(AuditConfig, sa_config::ConfigSnapshot)> {
    let loaded = load_config(global.config.as_deref())?;
    let effective = overrides.apply(loaded.config.clone());
    validate_config(&effective).map_err(ConfigError::from)?;
    let snapshot = loaded.snapshot(&effective);

    let label = effective.algorithm_label();
    log_event!(
        ctx,
        INFO,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "Configuration loaded",
        source = snapshot.source.as_str(),
        algorithm = label.as_str(),
        config_id = snapshot.short_id()
    );
    Ok((effective, snapshot))
}

/// Print a command payload; false if it could not be rendered.
fn print_payload<R: Render>(global: &GlobalOpts, payload: &R, ctx: &LogContext) -> bool {
    match payload.render(global.format) {
        Ok(out) => {
            println!("{}", out);
            true
        }
        Err(e) => {
            let message = e.to_string();
            log_event!(
                ctx,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Init,
                "Failed to render output",
                error = message.as_str()
            );
            false
        }
    }
}

fn run_audit_command(global: &GlobalOpts, args: &RunArgs, ctx: &LogContext) -> Result<ExitCode> {
    let (config, snapshot) = effective_config(global, &args.overrides, ctx)?;
    let bundle = args.input.load(ctx)?;

    let run = AuditRun::new(bundle.groups.clone(), &bundle.base_rates, &config)?
        .with_log_context(ctx.clone());
    let outcome = drive(run, &bundle.reports)?;

    let flagged = outcome.flagged();
    let report = RunReport::new(ctx.run_id.clone(), snapshot, &bundle.groups, outcome);
    if !print_payload(global, &report, ctx) {
        return Ok(ExitCode::InternalError);
    }
    Ok(ExitCode::from_flagged(flagged))
}

fn run_trial_command(global: &GlobalOpts, args: &TrialArgs, ctx: &LogContext) -> Result<ExitCode> {
    let (config, snapshot) = effective_config(global, &args.overrides, ctx)?;
    let bundle = args.input.load(ctx)?;

    let mut trial_config = TrialConfig::new(config.clone());
    trial_config.trials = args.trials;
    trial_config.seed_base = args.seed_base;
    if !args.alphas.is_empty() {
        trial_config.alphas = args.alphas.clone();
    }
    if !args.algorithms.is_empty() {
        trial_config.algorithms = args.algorithms.clone();
    }

    let matcher = GroupMatcher::new(bundle.groups.clone());
    let truth = flagged_groups(&matcher, &bundle.reports, &bundle.base_rates, config.beta)?;
    let rows = run_trials(&bundle, &trial_config, ctx)?;
    let summaries = summarize(&rows, &truth, &trial_config);

    let report = TrialReport {
        schema_version: OUTPUT_SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now(),
        config: snapshot,
        trials: trial_config.trials,
        alphas: trial_config.alphas.clone(),
        algorithms: trial_config.algorithms.iter().map(|a| a.label()).collect(),
        oracle_flagged: truth,
        rows,
        summaries,
    };
    if !print_payload(global, &report, ctx) {
        return Ok(ExitCode::InternalError);
    }
    Ok(ExitCode::Clean)
}

fn run_oracle_command(global: &GlobalOpts, args: &OracleArgs, ctx: &LogContext) -> Result<ExitCode> {
    let loaded = load_config(global.config.as_deref())?;
    let config = AuditConfig {
        beta: args.beta.unwrap_or(loaded.config.beta),
        ..loaded.config
    };
    validate_config(&config).map_err(ConfigError::from)?;
    let beta = config.beta;
    let bundle = args.input.load(ctx)?;

    let matcher = GroupMatcher::new(bundle.groups.clone());
    let rows = oracle_report(&matcher, &bundle.reports, &bundle.base_rates, beta, config.alpha)?;
    let report = OracleReport::new(ctx.run_id.clone(), beta, config.alpha, bundle.reports.len(), rows);
    log_event!(
        ctx,
        INFO,
        event_names::ORACLE_COMPUTED,
        Stage::Oracle,
        "Oracle computed",
        flagged = report.flagged(),
        beta = beta
    );

    if !print_payload(global, &report, ctx) {
        return Ok(ExitCode::InternalError);
    }
    Ok(ExitCode::from_flagged(report.flagged() > 0))
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs, ctx: &LogContext) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show { preset } => run_config_show(global, *preset, ctx),
        ConfigCommands::Validate { path } => run_config_validate(global, path.as_ref(), ctx),
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(AuditConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::Clean)
        }
    }
}

/// Display the effective configuration (defaults if no file is found).
fn run_config_show(global: &GlobalOpts, preset: Option<PresetName>, ctx: &LogContext) -> Result<ExitCode> {
    let overrides = AuditOverrides {
        preset,
        ..AuditOverrides::default()
    };
    let (config, snapshot) = effective_config(global, &overrides, ctx)?;

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "config": snapshot,
            });
            if global.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", serde_json::to_string(&response)?);
            }
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config: {} from {}",
                ctx.run_id,
                config.algorithm_label(),
                snapshot.path.as_deref().unwrap_or("built-in defaults")
            );
        }
        OutputFormat::Md => {
            println!("# seqaudit config show");
            println!();
            println!("Source: {}", snapshot.source);
            if let Some(path) = &snapshot.path {
                println!("Path: {}", path);
            }
            println!("Hash: {}", snapshot.effective_hash);
            println!();
            println!("| key | value |");
            println!("|-----|-------|");
            println!("| alpha | {} |", config.alpha);
            println!("| beta | {} |", config.beta);
            println!("| max_iter | {} |", config.max_iter);
            println!("| method | {} |", config.method);
            println!("| lambda_rule | {} |", config.lambda_rule);
            println!("| asymptotic | {} |", config.asymptotic);
            println!("| stop_at_first | {} |", config.stop_at_first);
        }
    }
    Ok(ExitCode::Clean)
}

/// Validate a configuration file.
fn run_config_validate(global: &GlobalOpts, path: Option<&PathBuf>, ctx: &LogContext) -> Result<ExitCode> {
    let target = path.or(global.config.as_ref());
    let loaded = load_config(target.map(|p| p.as_path()))?;
    let location = loaded
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "source": loaded.source.to_string(),
                "path": loaded.path.as_ref().map(|p| p.display().to_string()),
                "config": loaded.config,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Summary => {
            println!("[{}] config validate: OK ({})", ctx.run_id, location);
        }
        OutputFormat::Md => {
            println!("# Configuration Validation");
            println!();
            println!("Status: ✓ Valid");
            println!("Config: {}", location);
        }
    }
    Ok(ExitCode::Clean)
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let version_info = serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "config_schema_version": CONFIG_SCHEMA_VERSION,
                "seqaudit_version": env!("CARGO_PKG_VERSION"),
            });
            println!("{}", version_info);
        }
        _ => {
            println!("seqaudit {}", env!("CARGO_PKG_VERSION"));
            println!("output schema version: {}", OUTPUT_SCHEMA_VERSION);
            println!("config schema version: {}", CONFIG_SCHEMA_VERSION);
        }
    }
}

/// Report a failed command on stderr and pick its exit code.
fn output_error(global: &GlobalOpts, ctx: &LogContext, stage: Stage, error: &sa_common::Error) -> ExitCode {
    let event = match error.category() {
        ErrorCategory::Config => event_names::CONFIG_ERROR,
        ErrorCategory::Input => event_names::INPUT_ERROR,
        ErrorCategory::Io => event_names::IO_ERROR,
    };

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let record = ctx
                .error(event, stage, error.headline())
                .with_field("error", StructuredError::from(error));
            eprintln!("{}", record.to_jsonl());
        }
        _ => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(error, use_color));
        }
    }

    ExitCode::from_error(error)
}
