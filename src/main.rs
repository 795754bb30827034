//! Quizgrid - headless driver for the formula grid engine

mod logger;

use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use quizgrid_core::storage::load_fixture;
use quizgrid_core::{Dimensions, Sheet, SheetConfig};
use quizgrid_engine::engine::{CellRef, format_number, range_corners};
use quizgrid_engine::functions::RANGE_FUNCTIONS;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Size of the blank grid used when no fixture is given.
const BLANK_ROWS: usize = 10;
const BLANK_COLS: usize = 10;

fn print_usage() {
    eprintln!("Usage: quizgrid [OPTIONS] [FIXTURE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FIXTURE]                 Grid fixture to load (.toml)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula and print the result");
    eprintln!("  -s, --set <ADDR=VALUE>    Commit a value or formula to a cell (can be repeated)");
    eprintln!("  --fill <SRC:DST>          Fill from SRC towards DST (can be repeated)");
    eprintln!("  --config <FILE>           Load sheet settings from a TOML file");
    eprintln!("  -v, --verbose             Log commits and recalculation to stderr");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Functions:");
    for builtin in RANGE_FUNCTIONS {
        let call = format!("{}(A1:B2)", builtin.sheet_name);
        eprintln!("  {:<26}{}", call, builtin.description);
    }
    eprintln!("  {:<26}{}", "ABS(x)", "Absolute value of a number");
}

/// Edits applied to the sheet in command-line order.
enum Action {
    Set { address: String, value: String },
    Fill { range: String },
}

struct Options {
    fixture: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Option<String>,
    actions: Vec<Action>,
    verbose: bool,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options {
        fixture: None,
        config: None,
        command: None,
        actions: Vec::new(),
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-v" | "--verbose" => options.verbose = true,
            "-c" | "--command" => {
                i += 1;
                let formula = args.get(i).ok_or_else(|| anyhow!("--command requires a formula"))?;
                options.command = Some(formula.clone());
            }
            "-s" | "--set" => {
                i += 1;
                let edit = args.get(i).ok_or_else(|| anyhow!("--set requires ADDR=VALUE"))?;
                let (address, value) = edit
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Invalid --set value: {} (expected ADDR=VALUE)", edit))?;
                options.actions.push(Action::Set {
                    address: address.trim().to_string(),
                    value: value.to_string(),
                });
            }
            "--fill" => {
                i += 1;
                let range = args.get(i).ok_or_else(|| anyhow!("--fill requires SRC:DST"))?;
                options.actions.push(Action::Fill {
                    range: range.clone(),
                });
            }
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') => bail!("Unknown option: {}", arg),
            arg => {
                if options.fixture.is_some() {
                    bail!("Unexpected argument: {}", arg);
                }
                options.fixture = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }
    Ok(Some(options))
}

fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "quizgrid")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn load_config(explicit: Option<&Path>) -> Result<SheetConfig> {
    if let Some(path) = explicit {
        return SheetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            log::debug!("loading config from {}", path.display());
            SheetConfig::load(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        _ => Ok(SheetConfig::default()),
    }
}

fn load_sheet(fixture: Option<&Path>, config: SheetConfig) -> Result<Sheet> {
    let Some(path) = fixture else {
        return Ok(Sheet::with_cells(
            Dimensions::new(BLANK_ROWS, BLANK_COLS),
            Vec::new(),
            config,
        )?);
    };
    let fixture =
        load_fixture(path).with_context(|| format!("Failed to load fixture {}", path.display()))?;
    Ok(Sheet::from_fixture(fixture, config)?)
}

fn apply(sheet: &mut Sheet, action: &Action) -> Result<()> {
    match action {
        Action::Set { address, value } => {
            sheet
                .set_at(address, value)
                .with_context(|| format!("Failed to set {}", address))?;
        }
        Action::Fill { range } => {
            let (source, target) =
                range_corners(range).ok_or_else(|| anyhow!("Invalid fill range: {}", range))?;
            let run = sheet.fill_run(&source, &target);
            if run.is_empty() {
                log::warn!("fill {} has no editable destination cells", range);
                return Ok(());
            }
            let written = sheet.copy(&source, &run)?;
            log::debug!("fill {} wrote {} cells", range, written);
        }
    }
    Ok(())
}

fn print_grid(sheet: &Sheet) {
    let dims = sheet.dimensions();
    let header: Vec<String> = (0..dims.cols).map(CellRef::col_to_letters).collect();
    println!("\t{}", header.join("\t"));
    for row in 0..dims.rows {
        let values: Vec<String> = (0..dims.cols).map(|col| sheet.display(row, col)).collect();
        println!("{}\t{}", row + 1, values.join("\t"));
    }
    for row in 0..dims.rows {
        for col in 0..dims.cols {
            if let Some(diagnostic) = sheet.diagnostic(row, col) {
                eprintln!("{}: {}", CellRef::new(row, col), diagnostic);
            }
        }
    }
}

fn run(options: Options) -> Result<ExitCode> {
    logger::init(options.verbose);

    let config = load_config(options.config.as_deref())?;
    let mut sheet = load_sheet(options.fixture.as_deref(), config)?;
    for action in &options.actions {
        apply(&mut sheet, action)?;
    }

    let Some(formula) = options.command else {
        print_grid(&sheet);
        return Ok(ExitCode::SUCCESS);
    };
    match sheet.evaluate_formula(&formula) {
        Ok(value) => {
            println!("{}", format_number(value));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("#ERR: {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
