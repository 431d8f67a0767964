//! `libgraph lookup` command

use anyhow::Result;

use crate::cli::LookupArgs;
use libgraph::descriptors::ModuleLoadOptions;
use libgraph::ops::lookup::{format_lookup, lookup_class};
use libgraph::util::config;
use libgraph::util::{ColorChoice, Shell, Status};

pub fn execute(args: LookupArgs, color: ColorChoice) -> Result<()> {
    let shell = Shell::new(args.json, color);
    let cwd = std::env::current_dir()?;
    let config = config::load_for(&cwd);

    let options = ModuleLoadOptions::default().with_language_settings(config.language_settings()?);
    shell.status(
        Status::Resolving,
        format!("{} across {} libraries", args.class_id, args.libraries.len()),
    );
    let report = lookup_class(&args.class_id, &args.libraries, &options)?;

    if shell.is_json() {
        return shell.json_value(&report);
    }

    if !report.is_found() {
        shell.warn(format!("`{}` is not defined by any loaded library", args.class_id));
    }
    println!("{}", format_lookup(&report));
    if let Some(kind) = &report.kind {
        println!("  kind: {}", kind);
    }
    for supertype in &report.supertypes {
        println!("  supertype: {}", supertype);
    }

    Ok(())
}
