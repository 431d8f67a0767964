//! `libgraph interop` command

use anyhow::Result;

use crate::cli::InteropArgs;
use libgraph::ops::interop::{run_interop, InteropOptions};
use libgraph::util::config;
use libgraph::util::{ColorChoice, Shell, Status};

pub fn execute(args: InteropArgs, color: ColorChoice) -> Result<()> {
    let shell = Shell::new(false, color);
    let cwd = std::env::current_dir()?;

    let options = InteropOptions {
        flavor: args.flavor,
        tool: args.tool,
        print_only: args.print_only,
        config: config::load_for(&cwd),
    };

    let invocation = run_interop(&args.args, &options)?;

    if options.print_only {
        shell.note("library production skipped");
        println!("{}", invocation.compiler_args.join(" "));
        return Ok(());
    }

    let output = invocation
        .compiler_args
        .iter()
        .position(|a| a == "-o")
        .and_then(|i| invocation.compiler_args.get(i + 1))
        .map(String::as_str)
        .unwrap_or_default();
    shell.status(
        Status::Finished,
        format!(
            "`{}` for {} with {} libraries",
            output,
            invocation.target,
            invocation.libraries.len()
        ),
    );

    Ok(())
}
