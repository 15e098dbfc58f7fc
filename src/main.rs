mod cli;
mod cli_help;

use std::error::Error;
use std::io;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use lineowner::ownership::analyzer::CountMode;
use lineowner::ownership::{self, ShowOptions};
use lineowner::{logging, serve};

fn parse_count_mode(value: Option<&str>) -> Result<Option<CountMode>, Box<dyn Error>> {
    Ok(value.map(str::parse::<CountMode>).transpose()?)
}

fn dispatch(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Show {
            file,
            count_mode,
            ignore_blank_lines,
            max_file_size_kb,
            stdin,
            top,
            json,
            config,
        } => {
            let opts = ShowOptions {
                config_path: config.as_deref(),
                count_mode: parse_count_mode(count_mode.as_deref())?,
                ignore_blank_lines,
                max_file_size_kb,
                stdin,
                top,
                json,
            };
            ownership::run(&file, &opts)
        }
        Commands::Lines {
            file,
            author,
            stdin,
            json,
            config,
        } => ownership::run_lines(&file, config.as_deref(), author.as_deref(), stdin, json),
        Commands::Serve { config } => serve::run(config.as_deref()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "lo", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_subscriber(&cli.log_level);

    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
