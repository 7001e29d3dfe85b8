use std::io;

use anyhow::Result;
use java2rs_cli::{build_command, run};
use java2rs_core::{init_tracing, init_tracing_with};

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    // Initialize logging
    if matches.get_flag("debug") {
        init_tracing_with("java2rs_core=debug");
    } else {
        init_tracing();
    }

    let code = run(&matches, &mut io::stdout().lock())?;
    std::process::exit(code);
}
