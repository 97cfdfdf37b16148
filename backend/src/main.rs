//! Periodshift CLI - Convert period-indexed tables between frequencies
//!
//! # Main Commands
//!
//! ```bash
//! periodshift aggregate monthly.csv --to Q --method sum   # Months to quarters
//! periodshift disaggregate yearly.csv --from Y --to Q     # Years to quarters
//! periodshift plan list                                   # Manage saved plans
//! periodshift serve                                       # Start HTTP server
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! periodshift parse input.csv                             # Inspect a CSV
//! periodshift generate --sectors 3 --start 2020Q1 --end 2022Q4
//! ```

use clap::{Parser, Subcommand};
use periodshift::{
    convert_file, generate_table, log_info, log_warning, parse_table_file_auto, render,
    start_server, AggregationMethod, ConversionPlan, ConversionReport, Frequency,
    GeneratorConfig, OutputFormat, ParseOptions, Period, PeriodTable, PlanRegistry, Settings,
    DEFAULT_NOISE, DEFAULT_OUTPUT_DELIMITER, LOG_BROADCASTER,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "periodshift")]
#[command(about = "Aggregate and disaggregate period-indexed time series tables", long_about = None)]
struct Cli {
    /// Do not echo progress logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads a CSV.
#[derive(clap::Args)]
struct InputArgs {
    /// Input CSV file (first column holds period labels)
    input: PathBuf,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Column holding period labels (default: first column)
    #[arg(long)]
    index: Option<String>,
}

impl InputArgs {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            index_column: self.index.clone(),
            delimiter: self.delimiter,
        }
    }
}

/// Options shared by every command that writes a table.
#[derive(clap::Args)]
struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "csv")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy each period's values down to its finer child periods
    Disaggregate {
        #[command(flatten)]
        input: InputArgs,

        /// Frequency of the input (Y or Q)
        #[arg(long)]
        from: Frequency,

        /// Target frequency (Q or M)
        #[arg(long)]
        to: Frequency,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Group periods by their coarser parent and reduce them
    Aggregate {
        #[command(flatten)]
        input: InputArgs,

        /// Target frequency (M, Q or Y)
        #[arg(long)]
        to: Frequency,

        /// Reduction: sum or mean
        #[arg(short, long, default_value = "sum")]
        method: AggregationMethod,

        /// Reduce incomplete groups over their present values instead of dropping them
        #[arg(long)]
        keep_incomplete: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse a CSV file and report what was detected
    Parse {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate a synthetic table for testing
    Generate {
        /// Number of value columns
        #[arg(long, default_value = "3")]
        sectors: usize,

        /// First period, e.g. 2020Q1
        #[arg(long)]
        start: Period,

        /// Last period, same frequency as --start
        #[arg(long)]
        end: Period,

        /// Share of cells per column set to missing
        #[arg(long, default_value = "0")]
        null_ratio: f64,

        /// Standard deviation of the noise
        #[arg(long, default_value_t = DEFAULT_NOISE)]
        noise: f64,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PERIODSHIFT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage saved conversion plans
    Plan {
        /// Registry directory (default: PERIODSHIFT_REGISTRY_DIR or .periodshift/plans)
        #[arg(long)]
        registry: Option<PathBuf>,

        #[command(subcommand)]
        action: PlanAction,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// List all stored plans
    List,

    /// Import a plan JSON file
    Import {
        /// Plan JSON file to import
        file: PathBuf,
        /// Name for the plan
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show details of a plan
    Show {
        /// Plan ID or name
        id: String,
    },

    /// Delete a plan
    Delete {
        /// Plan ID
        id: String,
    },

    /// Run a stored plan against a CSV
    Use {
        /// Plan ID or name
        id: String,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }
    let settings = Settings::from_env();

    let result = match cli.command {
        Commands::Disaggregate {
            input,
            from,
            to,
            output,
        } => cmd_convert(&input, &ConversionPlan::Disaggregate { from, to }, &output),

        Commands::Aggregate {
            input,
            to,
            method,
            keep_incomplete,
            output,
        } => cmd_convert(
            &input,
            &ConversionPlan::Aggregate {
                to,
                method,
                ignore_incomplete: !keep_incomplete,
            },
            &output,
        ),

        Commands::Parse { input, output } => cmd_parse(&input, &output),

        Commands::Generate {
            sectors,
            start,
            end,
            null_ratio,
            noise,
            seed,
            output,
        } => cmd_generate(
            GeneratorConfig {
                sectors,
                start,
                end,
                null_ratio,
                noise,
                seed,
            },
            &output,
        ),

        Commands::Serve { port } => start_server(port.unwrap_or(settings.port)).await,

        Commands::Plan { registry, action } => {
            let dir = registry.unwrap_or_else(|| settings.registry_dir.clone());
            cmd_plan(&dir, action)
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &InputArgs,
    plan: &ConversionPlan,
    output: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = convert_file(&input.input, &input.parse_options(), plan)?;
    write_report(&report, output)
}

fn cmd_parse(input: &InputArgs, output: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.input.display());

    let parsed = parse_table_file_auto(&input.input, &input.parse_options())?;

    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(parsed.delimiter),
        if input.delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Frequency: {}", parsed.table.frequency().name());
    eprintln!("   Columns: {}", parsed.table.columns().join(", "));
    if let Some((first, last)) = parsed.table.span() {
        eprintln!("   Span: {} .. {}", first, last);
    }
    eprintln!("   Missing values: {}", parsed.table.missing_count());
    eprintln!("✅ Parsed {} rows", parsed.table.len());

    write_table(&parsed.table, output)
}

fn cmd_generate(
    config: GeneratorConfig,
    output: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = generate_table(&config)?;
    log_info(format!(
        "Generated {} rows x {} sectors ({} missing)",
        table.len(),
        table.columns().len(),
        table.missing_count()
    ));
    write_table(&table, output)
}

fn write_report(
    report: &ConversionReport,
    output: &OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    write_table(&report.output, output)
}

fn write_table(table: &PeriodTable, output: &OutputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = render(table, output.format, DEFAULT_OUTPUT_DELIMITER)?;
    write_output(&content, output.output.as_deref())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None if content.ends_with('\n') => print!("{}", content),
        None => println!("{}", content),
    }
    Ok(())
}

fn cmd_plan(dir: &Path, action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = PlanRegistry::with_dir(dir);

    match action {
        PlanAction::List => {
            let plans = registry.list();
            if plans.is_empty() {
                eprintln!("📋 No plans stored in {}.", registry.dir().display());
                eprintln!("   Use 'periodshift plan import <file>' to add one.");
                return Ok(());
            }

            eprintln!("📋 Stored plans ({}):\n", plans.len());
            for p in plans {
                println!("  📄 {} ({})", p.name, p.id);
                println!("     Plan: {}", p.plan.describe(None));
                println!("     Uses: {}", p.use_count);
                if let Some(ref last) = p.last_used {
                    println!("     Last used: {}", last);
                }
                println!();
            }
        }

        PlanAction::Import { file, name } => {
            eprintln!("📥 Importing plan from: {}", file.display());
            let id = registry.import(&file, name.as_deref())?;
            eprintln!("✅ Plan saved with ID: {}", id);
        }

        PlanAction::Show { id } => {
            let p = registry
                .get(&id)
                .ok_or_else(|| format!("Plan not found: {}", id))?;
            println!("📄 Plan: {} ({})\n", p.name, p.id);
            println!("Created: {}", p.created_at);
            println!("Uses: {}", p.use_count);
            println!("\n{}", p.plan.to_json()?);
        }

        PlanAction::Delete { id } => {
            registry.delete(&id)?;
            eprintln!("🗑️  Plan deleted: {}", id);
        }

        PlanAction::Use { id, input, output } => {
            let (plan_id, plan) = {
                let stored = registry
                    .get(&id)
                    .ok_or_else(|| format!("Plan not found: {}", id))?;
                (stored.id.clone(), stored.plan.clone())
            };
            eprintln!("📄 Using plan: {} ({})", id, plan.describe(None));

            let report = convert_file(&input.input, &input.parse_options(), &plan)?;
            if let Err(e) = registry.record_use(&plan_id) {
                log_warning(format!("Could not update plan statistics: {}", e));
            }
            write_report(&report, &output)?;
        }
    }

    Ok(())
}
