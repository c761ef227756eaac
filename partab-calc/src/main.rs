//! Command-line interface for the partab calculator.
//!
//! Evaluates statements from a file (one per line) or a single expression
//! given on the command line, printing each result. Set `RUST_LOG=trace`
//! to watch the shift-reduce steps.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use partab_calc::Calc;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates statements from a file, one per line
    Run {
        /// Input file with calculator statements
        #[arg(short, long)]
        input: String,
    },
    /// Evaluates a single expression
    Eval {
        /// The expression
        expr: String,
    },
    /// Prints the automaton: productions, item sets, and the action table
    Dump,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Commands::Run { input } => {
            let source = std::fs::read_to_string(&input)
                .with_context(|| format!("can't open {:?}", input))?;
            let mut calc = Calc::try_new()?;
            for line in source.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let result = calc
                    .eval(line)
                    .with_context(|| format!("evaluating {:?}", line))?;
                println!("{} = {}", line, result);
            }
        }
        Commands::Eval { expr } => {
            let mut calc = Calc::try_new()?;
            println!("{}", calc.eval(&expr)?);
        }
        Commands::Dump => {
            let parser = partab_calc::calc_parser()?;
            print!("{}", parser.dump());
        }
    }
    Ok(())
}
