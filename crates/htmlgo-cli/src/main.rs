use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use htmlgo_core::prevalidate::prevalidate;
use htmlgo_core::{
    BufferEditor, ClientConfig, ConversionDirection, ConvertError, EditorId, Environment,
    HostIdentity, HttpTransport, PrefixConfig, Session, TracingSink,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use url::Url;

mod telemetry;

#[derive(Parser)]
#[command(version, about = "Convert between markup and htmlgo builder code", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "HTMLGO_CONFIG")]
    config: Option<PathBuf>,

    /// Conversion service URL (origin or full handler URL)
    #[arg(long, global = true)]
    endpoint: Option<Url>,

    /// Force the environment instead of classifying the host
    #[arg(long = "env", global = true, value_parser = ["prod", "local"])]
    environment: Option<String>,

    /// Host identity to classify, as hostname[:port]
    #[arg(long, global = true)]
    host: Option<HostIdentity>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markup into builder code
    ToCode {
        /// Markup file; reads stdin when omitted
        input: Option<PathBuf>,

        #[command(flatten)]
        prefixes: PrefixArgs,

        /// Emit nested elements through an explicit Children(...) call
        #[arg(long)]
        children_mode: bool,
    },
    /// Convert builder code back into markup
    ToMarkup {
        /// Code file; reads stdin when omitted
        input: Option<PathBuf>,
    },
    /// Run only the local checks on builder code
    Check {
        /// Code file; reads stdin when omitted
        input: Option<PathBuf>,
    },
    /// Check that the service honours the component prefixes
    Probe {
        #[command(flatten)]
        prefixes: PrefixArgs,
    },
    /// Print the resolved environment and conversion URL
    Env,
}

#[derive(Args, Debug, Default)]
struct PrefixArgs {
    /// Package prefix for plain elements
    #[arg(long)]
    package_prefix: Option<String>,

    /// Package prefix for the primary component library
    #[arg(long)]
    vuetify_prefix: Option<String>,

    /// Package prefix for the extended component library
    #[arg(long)]
    vuetify_x_prefix: Option<String>,
}

impl PrefixArgs {
    fn apply(&self, prefixes: &mut PrefixConfig) {
        if let Some(prefix) = &self.package_prefix {
            prefixes.package_prefix = prefix.as_str().into();
        }
        if let Some(prefix) = &self.vuetify_prefix {
            prefixes.component_prefix_primary = prefix.as_str().into();
        }
        if let Some(prefix) = &self.vuetify_x_prefix {
            prefixes.component_prefix_extended = prefix.as_str().into();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_miette();
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    let host = cli.host.clone().unwrap_or_else(|| config.default_host());
    let environment = config.environment(&host);
    telemetry::init(environment);
    tracing::debug!(%environment, host = %host.hostname, port = ?host.port, "environment resolved");

    match cli.command {
        Commands::ToCode {
            input,
            prefixes,
            children_mode,
        } => {
            prefixes.apply(&mut config.prefixes);
            config.children_mode |= children_mode;
            let source = read_input(input.as_deref())?;
            convert(&config, environment, ConversionDirection::ToCode, source).await
        }
        Commands::ToMarkup { input } => {
            let source = read_input(input.as_deref())?;
            convert(&config, environment, ConversionDirection::ToMarkup, source).await
        }
        Commands::Check { input } => {
            let source = read_input(input.as_deref())?;
            Ok(check(&source))
        }
        Commands::Probe { prefixes } => {
            prefixes.apply(&mut config.prefixes);
            probe(&config, environment).await
        }
        Commands::Env => {
            let url = config.conversion_url(environment)?;
            println!("environment: {environment}");
            println!("url: {url}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env()?;

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.to_string());
    }
    if let Some(environment) = &cli.environment {
        config.environment = Some(environment.clone());
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin())
            .into_diagnostic()
            .wrap_err("failed to read stdin"),
    }
}

fn session(
    config: &ClientConfig,
    environment: Environment,
    markup: BufferEditor,
    code: BufferEditor,
) -> Result<Session<BufferEditor, BufferEditor, HttpTransport, TracingSink>> {
    let url = config.conversion_url(environment)?;
    let transport = HttpTransport::with_timeout(url, config.timeout())?;
    Ok(Session::new(markup, code, transport)
        .with_instrumentation(TracingSink, environment)
        .with_prefixes(config.prefixes.clone())
        .with_children_mode(config.children_mode))
}

/// Run one conversion and print whatever lands in the target editor.
async fn convert(
    config: &ClientConfig,
    environment: Environment,
    direction: ConversionDirection,
    source: String,
) -> Result<ExitCode> {
    let (markup, code) = match direction {
        ConversionDirection::ToCode => (
            BufferEditor::with_content(EditorId::Markup, source),
            BufferEditor::new(EditorId::Code),
        ),
        ConversionDirection::ToMarkup => (
            BufferEditor::new(EditorId::Markup),
            BufferEditor::with_content(EditorId::Code, source),
        ),
    };
    let session = session(config, environment, markup, code)?;

    let outcome = session.convert(direction).await;
    let Some(mutation) = outcome.mutation() else {
        miette::bail!("conversion dropped: another conversion was in flight");
    };

    println!("{}", mutation.content);
    Ok(if mutation.is_diagnostic() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn check(source: &str) -> ExitCode {
    match prevalidate(source) {
        Ok(validated) => {
            if let Some(rule) = validated.rewritten_by {
                tracing::info!(rule, "code rewritten");
            }
            println!("{}", validated.code);
            ExitCode::SUCCESS
        }
        Err(defect) => {
            let error = ConvertError::from(defect);
            println!("{}", error.render(ConversionDirection::ToMarkup));
            ExitCode::FAILURE
        }
    }
}

async fn probe(config: &ClientConfig, environment: Environment) -> Result<ExitCode> {
    let session = session(
        config,
        environment,
        BufferEditor::new(EditorId::Markup),
        BufferEditor::new(EditorId::Code),
    )?;
    let report = session.probe().await?;
    let prefixes = session.prefixes();

    let mark = |ok: bool| if ok { "ok" } else { "FAIL" };
    println!(
        "{:>4}  primary prefix '{}' used",
        mark(report.primary_prefix_used),
        prefixes.component_prefix_primary
    );
    println!(
        "{:>4}  extended prefix '{}' used",
        mark(report.extended_prefix_used),
        prefixes.component_prefix_extended
    );
    println!(
        "{:>4}  primary prefix not fused with package prefix",
        mark(!report.primary_prefix_fused)
    );
    println!(
        "{:>4}  extended prefix not fused with package prefix",
        mark(!report.extended_prefix_fused)
    );
    println!();
    println!("{}", report.code);

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
