use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use gs1_scan_core::detector::{is_bare_gtin, prepare_scan};
use gs1_scan_core::{
    date, is_plausible_gs1_dl_uri, HttpLicensingSource, Interpretation, Interpreter, InterpreterConfig,
    LicensingSource, ScanResult, StaticLicensingSource, GROUP_SEPARATOR,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// gs1scan - GS1 barcode scan interpreter
///
/// Normalize bare GTINs, element strings and GS1 Digital Link URIs.
#[derive(Parser)]
#[command(name = "gs1scan", version, about, long_about = None)]
struct Cli {
    /// Log pipeline events to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a scan
    Interpret {
        /// Scan data; `-` or nothing reads one line from stdin
        scan: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Look up the licensing GS1 Member Organisation
        #[arg(long)]
        licensing: bool,
        /// Prefix list file to use for licensing instead of fetching it
        #[arg(long, value_name = "FILE")]
        mo_prefixes: Option<PathBuf>,
        /// TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show how a scan is classified before conversion
    Detect {
        scan: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a GS1 YYMMDD date to ISO 8601
    Date {
        /// Six-digit GS1 date
        date: String,
        /// Reference year for the century window (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Interpret {
            scan,
            json,
            licensing,
            mo_prefixes,
            config,
        } => run_interpret(scan, json, licensing, mo_prefixes, config).await,
        Commands::Detect { scan, json } => run_detect(&scan, json),
        Commands::Date { date: gs1_date, year } => {
            let iso = date::gs1_to_iso_with_year(&gs1_date, year.unwrap_or_else(date::current_year));
            if iso.is_empty() {
                eprintln!("{} '{}' is not a six-digit GS1 date", "✗".red(), gs1_date);
                1
            } else {
                println!("{}", iso);
                0
            }
        }
        Commands::Version => {
            println!("gs1scan {} (gs1-scan-core {})", env!("CARGO_PKG_VERSION"), gs1_scan_core::VERSION);
            0
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Interpret ─────────────────────────────────────────────

async fn run_interpret(
    scan: Option<String>,
    json: bool,
    licensing: bool,
    mo_prefixes: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> i32 {
    let scan = match scan.filter(|s| s != "-") {
        Some(scan) => scan,
        None => match read_stdin_line() {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{} failed to read scan from stdin: {}", "error:".red().bold(), e);
                return 2;
            }
        },
    };

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return 2;
        }
    };

    let wants_licensing = (licensing || mo_prefixes.is_some()) && config.licensing.enabled;
    tracing::debug!(
        resolver_domain = %config.resolver_domain,
        licensing = wants_licensing,
        "configuration loaded"
    );
    let source: Option<Box<dyn LicensingSource>> = if wants_licensing {
        match licensing_source(&config, mo_prefixes) {
            Ok(source) => Some(source),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return 2;
            }
        }
    } else {
        None
    };

    let interpreter = Interpreter::new(config);
    let interpretation = match &source {
        Some(source) => interpreter.interpret_with_licensing(&scan, &**source).await,
        None => interpreter.interpret(&scan),
    };

    if json {
        match serde_json::to_string_pretty(&interpretation) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return 2;
            }
        }
    } else {
        print_interpretation(&interpretation);
    }

    if interpretation.is_success() {
        0
    } else {
        1
    }
}

fn read_stdin_line() -> std::io::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn load_config(path: Option<PathBuf>) -> gs1_scan_core::Result<InterpreterConfig> {
    let config = match path {
        Some(path) => InterpreterConfig::from_file(path)?,
        None => InterpreterConfig::default(),
    };
    config.with_env_overrides()
}

fn licensing_source(
    config: &InterpreterConfig,
    mo_prefixes: Option<PathBuf>,
) -> gs1_scan_core::Result<Box<dyn LicensingSource>> {
    match mo_prefixes.or_else(|| config.licensing.prefixes_file.clone()) {
        Some(path) => Ok(Box::new(StaticLicensingSource::from_json_file(path)?)),
        None => Ok(Box::new(HttpLicensingSource::new(
            config.licensing.url.clone(),
            config.licensing.timeout(),
        )?)),
    }
}

fn print_interpretation(interpretation: &Interpretation) {
    match interpretation {
        Interpretation::Success(result) => print_result(result),
        Interpretation::Failure(failure) => {
            eprintln!("{} {}", "✗".red(), failure.errmsg);
        }
    }
}

fn print_result(result: &ScanResult) {
    println!("{} GS1 scan interpreted", "✓".green());
    println!("  {:<14} {}", "Digital Link:".bold(), result.dl);
    println!("  {:<14} {}", "Brackets:".bold(), result.ai_brackets);
    println!("  {:<14} {}", "FNC1:".bold(), show_separators(&result.ai_fnc1));
    if let Some(mo) = &result.licensing_mo {
        println!("  {:<14} {}", "Licensed by:".bold(), mo);
    }
    println!();
    for element in &result.ol {
        match &element.label {
            Some(label) => println!("  {:>8}  {:<32} {}", element.ai.cyan(), label, element.value),
            None => println!("  {:>8}  {:<32} {}", element.ai.dimmed(), "", element.value),
        }
    }
}

fn show_separators(s: &str) -> String {
    s.replace(GROUP_SEPARATOR, "<GS>")
}

// ── Detect ────────────────────────────────────────────────

fn run_detect(scan: &str, json: bool) -> i32 {
    let prepared = prepare_scan(scan);
    let plausibility = is_plausible_gs1_dl_uri(&prepared.text);
    let gtin_shortcut = is_bare_gtin(scan);

    if json {
        let value = serde_json::json!({
            "plausibility": plausibility,
            "gtin_shortcut": gtin_shortcut,
            "prepared": prepared.text,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return 2;
            }
        }
        return 0;
    }

    let flag = |b: bool| if b { "yes".green() } else { "no".dimmed() };
    println!("  {:<26} {}", "bare GTIN:", flag(gtin_shortcut));
    println!("  {:<26} {}", "uncompressed (with alphas):", flag(plausibility.uncompressed_with_alphas));
    println!("  {:<26} {}", "uncompressed:", flag(plausibility.uncompressed));
    println!("  {:<26} {}", "compressed:", flag(plausibility.compressed));
    println!("  {:<26} {}", "any:", flag(plausibility.any));
    println!("  {:<26} {}", "any (no alphas):", flag(plausibility.any_no_alphas));
    0
}
