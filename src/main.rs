use std::process::ExitCode;

use console::{style, Term};
use log::error;

use pac_packer::driver::Report;
use pac_packer::options::usage;
use pac_packer::{run, ConsoleKeys, Error, Flag, Options, OverwriteGuard, PacCodec};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    println!("\n{}\n", style("PAC Packer").dim());

    let options = Options::parse(std::env::args().skip(1));
    if options.has(Flag::Help) {
        print!("{}", usage());
        return ExitCode::SUCCESS;
    }

    let mut guard = OverwriteGuard::new(ConsoleKeys::new());
    let code = match run(&options, &PacCodec::new(), &mut guard) {
        Ok(report) => {
            summarize(&report);
            println!("\n{}\n", style("Done!").green());
            ExitCode::SUCCESS
        }
        Err(Error::MissingTarget) => {
            println!("Please input the path of a folder.");
            ExitCode::FAILURE
        }
        Err(err @ Error::PathUnavailable { .. }) | Err(err @ Error::MissingDirectory(_)) => {
            println!("{}", style(&err).red());
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{:?}", err);
            println!("{}", style(&err).red());
            println!("{}", style("Something went wrong!").red());
            ExitCode::FAILURE
        }
    };

    if !options.has(Flag::Continue) {
        println!("Press any key to exit...");
        let _ = Term::stdout().read_key();
    }
    code
}

fn summarize(report: &Report) {
    match report {
        Report::Packed(path) => println!("Saved {}", path.display()),
        Report::Unpacked(report) => {
            println!(
                "Unpacked {} archive(s): {} file(s) written, {} kept, {} skipped",
                report.archives,
                report.written.len(),
                report.kept.len(),
                report.skipped.len()
            );
        }
    }
}
