// Entry point: parses arguments, initialises logging, and maps the
// pipeline's result onto the process exit code (§6/§7 — one line on
// stderr on failure unless debug mode is on; the container's own exit
// code passes through unchanged when one ran).

mod bridge_run;
mod cli;
mod pipeline;

use ccbox_core::ccbox_error;
use clap::Parser;
use cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let debug = args.debug;

    if ccbox_core::tracing_init::init().is_err() {
        eprintln!("Warning: failed to initialize structured logging");
    }

    match pipeline::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if debug {
                ccbox_error!("{e}");
            } else {
                ccbox_error!("{}", e.to_string().lines().next().unwrap_or(""));
            }
            std::process::exit(1);
        }
    }
}
