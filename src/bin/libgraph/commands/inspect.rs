//! `libgraph inspect` command

use anyhow::Result;

use crate::cli::InspectArgs;
use libgraph::descriptors::ModuleLoadOptions;
use libgraph::ops::inspect::{format_report, inspect_libraries, InspectOptions};
use libgraph::util::config;
use libgraph::util::{ColorChoice, Shell, Status};

pub fn execute(args: InspectArgs, color: ColorChoice) -> Result<()> {
    let shell = Shell::new(args.json, color);
    let cwd = std::env::current_dir()?;
    let config = config::load_for(&cwd);

    let options = InspectOptions {
        load: ModuleLoadOptions::default().with_language_settings(config.language_settings()?),
        classifiers: args.classifiers,
    };
    let reports = inspect_libraries(&args.libraries, &options)?;

    if shell.is_json() {
        return shell.json_value(&reports);
    }

    for report in &reports {
        shell.status(
            Status::Loaded,
            format!("{} from {}", report.module, report.library),
        );
        print!("{}", format_report(report));
    }

    Ok(())
}
