use std::{env, process};

use daily_checklist::{cli, init};

fn main() {
    init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = if args.is_empty() {
        cli::run_cli()
    } else {
        cli::run_command(&args)
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
