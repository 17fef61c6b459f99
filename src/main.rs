use anyhow::{Context, Result};
use apktriage::cli::Cli;
use apktriage::config::TriageConfig;
use apktriage::decompile::ApktoolDecompiler;
use apktriage::pipeline::{self, Triage};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; reports go to stdout, logs to stderr
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> Result<TriageConfig> {
    let config = match &args.config {
        Some(path) => TriageConfig::from_file(path)?,
        None => TriageConfig::default(),
    };
    Ok(args.apply_overrides(config))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let decompiler = ApktoolDecompiler::new(&config.apktool);

    let report = if args.extract_only {
        let schema = config.schema().context("invalid feature catalog")?;
        let root = pipeline::prepare_target(&args.target, &decompiler, &config.work_dir)?;
        let mut report = pipeline::extract_report(&schema, config.matcher, &root);
        report.target = args.target.clone();
        report
    } else {
        let triage = Triage::load(&config)?;
        triage.analyze(&args.target, &decompiler, &config.work_dir)?
    };

    print!("{}", report.render(args.format, args.show_features)?);
    Ok(())
}
