//! # SiteCalc CLI
//!
//! Command-line front end for the sitecalc_core engine. Results are
//! printed as JSON on stdout so the output can feed scripts and other
//! tools; diagnostics go to stderr via tracing.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sitecalc_core::crane_db::{CraneSpecStore, MemoryCraneStore, SqliteCraneStore};
use sitecalc_core::params::ParameterModel;
use sitecalc_core::registry::{registered_kinds, CalculationKind};
use sitecalc_core::report::{compose, write_report, TypstRenderer};
use sitecalc_core::store::ProjectStore;
use sitecalc_core::{file_io, CalcError, CalcResult};

#[derive(Parser)]
#[command(name = "sitecalc", about = "Construction-site calculation engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered calculation kinds and their stable codes
    Kinds,
    /// Create a project file with default parameters
    New {
        /// Calculation kind code (6 = excavation slope, 7 = truck crane)
        #[arg(long, default_value_t = 6)]
        kind: u32,
        /// Project display name
        #[arg(long, default_value = "Untitled")]
        name: String,
        /// Output project file
        file: PathBuf,
    },
    /// Run the calculation stored in a project file
    Run {
        /// Project file to load
        file: PathBuf,
        /// Crane-spec SQLite database; built-in sample data when absent
        #[arg(long)]
        db: Option<PathBuf>,
        /// Also write a PDF report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run both built-in demo calculations against the sample crane data
    Demo,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{json}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> CalcResult<()> {
    match command {
        Command::Kinds => {
            for info in registered_kinds() {
                println!("{:>4}  {}", info.code, info.display_name);
            }
            Ok(())
        }
        Command::New { kind, name, file } => {
            let model = match CalculationKind::from_code(kind) {
                Some(CalculationKind::SoilEmbankment) => ParameterModel::new_slope(name),
                Some(CalculationKind::HydraulicTruckCrane) => {
                    ParameterModel::new_truck_crane(name)
                }
                Some(other) => {
                    return Err(CalcError::unsupported_case(
                        other.display_name(),
                        "this kind cannot be created from the CLI",
                    ))
                }
                None => {
                    return Err(CalcError::invalid_parameters(
                        "kind",
                        kind.to_string(),
                        "unknown calculation kind code",
                    ))
                }
            };
            file_io::save_model(&model, &file)?;
            tracing::info!(path = %file.display(), "project created");
            Ok(())
        }
        Command::Run { file, db, report } => {
            let crane_store = open_crane_store(db)?;
            let model = file_io::load_model(&file)?;
            tracing::info!(
                name = %model.display_name,
                kind = model.kind.display_name(),
                "project loaded"
            );

            let mut store = ProjectStore::new();
            let id = store.add_loaded(model);
            let result = store.calculate(id, crane_store.as_ref())?;

            if let Some(report_path) = report {
                let model = store
                    .get(id)
                    .ok_or_else(|| CalcError::internal("project vanished from the store"))?;
                let doc = compose(model, &result)?;
                write_report(&doc, &TypstRenderer::new(), &report_path)?;
                store.mark_reported(id)?;
            }

            let json = serde_json::to_string_pretty(&result).map_err(|e| {
                CalcError::SerializationError {
                    reason: e.to_string(),
                }
            })?;
            println!("{json}");
            Ok(())
        }
        Command::Demo => {
            let crane_store = MemoryCraneStore::sample();
            let mut store = ProjectStore::new();

            let slope_id = store.add(ParameterModel::new_slope("Demo pit"));
            let crane_id = store.add(ParameterModel::new_truck_crane("Demo lift"));
            store.update(crane_id, |params| {
                if let sitecalc_core::CalculationParams::TruckCrane(m) = params {
                    m.load_gw_t = 8.0;
                    m.dynamic_factor_k1 = 1.2;
                    m.manufacturer = "XCMG".to_string();
                    m.model = "QY25K".to_string();
                }
            })?;

            for id in [slope_id, crane_id] {
                let result = store.calculate(id, &crane_store)?;
                let json = serde_json::to_string_pretty(&result).map_err(|e| {
                    CalcError::SerializationError {
                        reason: e.to_string(),
                    }
                })?;
                println!("{json}");
            }
            Ok(())
        }
    }
}

fn open_crane_store(db: Option<PathBuf>) -> CalcResult<Box<dyn CraneSpecStore>> {
    match db {
        Some(path) => {
            tracing::info!(path = %path.display(), "using crane database");
            Ok(Box::new(SqliteCraneStore::open(&path)?))
        }
        None => {
            tracing::debug!("no crane database given, using sample data");
            Ok(Box::new(MemoryCraneStore::sample()))
        }
    }
}
