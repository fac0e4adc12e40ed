//! Blombly virtual machine runner.

use std::path::Path;
use std::process::ExitCode;

use bb_eval::Vm;

fn print_usage() {
    eprintln!("Usage: bbvm <file.bbvm> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --threads=<n>    Run at most n calls concurrently (0 runs every call in place)");
}

fn main() -> ExitCode {
    bb_eval::init_tracing();

    let mut builder = Vm::builder();
    let mut file_path = None;
    for arg in std::env::args().skip(1) {
        if let Some(count) = arg.strip_prefix("--threads=") {
            match count.parse::<usize>() {
                Ok(limit) => builder = builder.max_threads(limit),
                Err(_) => {
                    eprintln!("error: invalid thread count `{count}`");
                    return ExitCode::FAILURE;
                }
            }
        } else if arg == "-h" || arg == "--help" {
            print_usage();
            return ExitCode::SUCCESS;
        } else if !arg.starts_with('-') && file_path.is_none() {
            file_path = Some(arg);
        } else {
            eprintln!("error: unexpected argument `{arg}`");
            print_usage();
            return ExitCode::FAILURE;
        }
    }

    let Some(path) = file_path else {
        print_usage();
        return ExitCode::FAILURE;
    };

    match builder.build().run_file(Path::new(&path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
