use std::process;

use batch_core::{AssetLibrary, BatchImporter, ImportSettings};
use batch_scene::Scene;

mod cli;
mod host;
mod logging;
mod snapshot;

use cli::{CliArgs, Command};
use host::FileHost;
use snapshot::LibrarySnapshot;

fn main() {
    let log_level_state = logging::setup_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match cli::parse_args(&args) {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => {
            cli::print_help();
            return;
        }
        Err(err) => {
            eprintln!("error: {err}");
            cli::print_help();
            process::exit(2);
        }
    };
    if let Some(level) = cli.log_level {
        logging::set_level(&log_level_state, level);
    }

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: &CliArgs) -> Result<(), String> {
    let settings = match &cli.config {
        Some(path) => ImportSettings::load(path).map_err(|err| err.to_string())?,
        None => ImportSettings::default(),
    };

    let mut scene = Scene::new();
    let mut library = AssetLibrary::default();
    let mut host = FileHost;
    let library_dir = cli.library_dir();

    let report = BatchImporter::new(settings)
        .run(&cli.folder, &library_dir, &mut scene, &mut library, &mut host)
        .map_err(|err| err.to_string())?;
    tracing::info!(
        "imported {} folders, {} assets marked",
        report.folders.len(),
        report.marked_objects + report.material_assets.len()
    );

    if let Some(path) = &cli.save {
        LibrarySnapshot {
            scene: &scene,
            library: &library,
            report: &report,
        }
        .save(path)?;
        tracing::info!("saved library snapshot to {}", path.display());
    }

    if cli.print {
        let json = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{json}");
    }

    Ok(())
}
