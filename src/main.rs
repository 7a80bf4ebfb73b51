use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use theme_grid::build::{self, ArtifactStatus};
use theme_grid::config::Config;
use theme_grid::grid::Combination;
use theme_grid::output;
use theme_grid::pipeline::Pipeline;
use theme_grid::tools::SystemTools;

/// File the run summary is written to after a build, next to the index.
const REPORT_FILE: &str = "build-report.json";

#[derive(Parser)]
#[command(name = "theme-grid")]
#[command(about = "Combinatorial theme gallery generator for beamer decks")]
#[command(long_about = "\
Combinatorial theme gallery generator for beamer decks

Declares a set of styling axes, renders a demo deck for every combination of
their values, compiles each deck, rasterizes preview images, and writes an
R Markdown index showing the whole grid.

Output layout (stock config, rooted at --root):

  <root>/
  ├── themes.Rmd                   # Index: tabbed sections nested by axis
  ├── build-report.json            # Run summary (after `build`)
  ├── default/default/default/     # One directory per combination
  │   ├── Example.tex              # Generated source (never overwritten)
  │   ├── Example.pdf              # Compiled deck
  │   └── Example-1..4.png         # Preview images
  └── circles/infolines/serif/
      └── ...

Freshness is file presence: stages whose output already exists are skipped,
so interrupted runs resume where they stopped and re-runs are no-ops. To
rebuild a combination, delete its directory.")]
#[command(version)]
struct Cli {
    /// Configuration file (stock defaults are used when absent)
    #[arg(long, default_value = "theme-grid.toml", global = true)]
    config: PathBuf,

    /// Directory where artifacts and the index are generated
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the combination grid and each combination's artifact status
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate sources, compile, rasterize and write the index
    Build,
    /// Validate the configuration and probe the external tools
    Check,
    /// Print a stock theme-grid.toml with all options documented
    GenConfig,
}

#[derive(Serialize)]
struct PlanEntry {
    combination: Combination,
    path: String,
    status: ArtifactStatus,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Plan { json } => {
            let config = Config::load_or_default(&cli.config)?;
            let axes = config.axis_set()?;
            let entries = build::survey(&cli.root, &axes, &config.artifact);
            if json {
                let plan: Vec<PlanEntry> = entries
                    .into_iter()
                    .map(|(combination, status)| PlanEntry {
                        path: combination.label(),
                        combination,
                        status,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan_output(&axes, &entries);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Build => {
            let config = Config::load_or_default(&cli.config)?;
            let tools = SystemTools::new(config.tools.clone());
            let pipeline = Pipeline::new(&cli.root, &config, &tools)?;
            let summary = pipeline.run(&mut |event| output::print_pipeline_event(&event))?;

            let report = serde_json::to_string_pretty(&summary)?;
            std::fs::write(cli.root.join(REPORT_FILE), report)?;

            output::print_run_summary(&summary);
            Ok(if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check => {
            let config = if cli.config.exists() {
                println!("Config: {}", cli.config.display());
                Config::load(&cli.config)?
            } else {
                println!("Config: stock defaults ({} not found)", cli.config.display());
                Config::default()
            };
            let axes = config.axis_set()?;

            println!("Axes");
            for axis in axes.axes() {
                println!("    {}: {} values", axis.name, axis.values.len());
            }
            println!("Combinations: {}", axes.combination_count());
            println!(
                "Index: {}",
                cli.root.join(&config.manifest.file).display()
            );

            println!("Tools");
            let tools = SystemTools::new(config.tools.clone());
            let probes = tools.probe();
            for probe in &probes {
                let verdict = if probe.available { "found" } else { "NOT FOUND" };
                println!("    {}: {}", probe.program, verdict);
            }

            if probes.iter().all(|p| p.available) {
                println!("==> Ready");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("==> Missing tools; `build` would fail every combination");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::GenConfig => {
            print!("{}", theme_grid::config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}
