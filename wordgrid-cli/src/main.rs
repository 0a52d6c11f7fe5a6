use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::error;

use wordgrid::config::GeneratorConfig;
use wordgrid::formatter::{format, Format};
use wordgrid::generator::Generator;
use wordgrid::{Grid, Reporter};

/// Crossword grid generator.
///
/// Generation parameters are read from standard input, whitespace
/// separated: number of rows, number of columns, minimum and maximum
/// number of black squares, heuristic (0 frequency, 1 random, anything
/// greater none), maximum number of choices at each step, options bitmask
/// (1 symmetric black squares, 2 connected white squares, 4 linear black
/// squares) and an optional random seed.
#[derive(Parser)]
#[command(name = "wordgrid", version, about, long_about = None)]
struct Args {
    /// The dictionary file: one word per line, letters only.
    dictionary: PathBuf,

    /// The output format for solution grids. `text` or `json` can be
    /// specified.
    #[arg(short, long, default_value = "text")]
    output: Format,
}

struct StdoutReporter {
    format: Format,
}

impl StdoutReporter {
    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl Reporter for StdoutReporter {
    fn pass_started(&mut self, choices_max: usize) {
        println!("CHOICES {}", choices_max);
        self.flush();
    }

    fn cell_entered(&mut self, row: i32, col: i32) {
        println!("CELL {} {}", row, col);
        self.flush();
    }

    fn solution(&mut self, grid: &Grid, blacks: usize) {
        println!("BLACK SQUARES {}", blacks);
        match format(grid, self.format) {
            Ok(text) => println!("{}", text),
            Err(err) => error!("could not format the grid: {}", err),
        }
        self.flush();
    }

    fn accepted(&mut self) {
        println!("SOLUTION FOUND");
        self.flush();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut params = String::new();
    io::stdin()
        .read_to_string(&mut params)
        .context("could not read the parameters from standard input")?;
    let config = GeneratorConfig::from_params_str(&params)?;
    let mut generator = Generator::from_path(&args.dictionary, &config)?;

    let mut reporter = StdoutReporter {
        format: args.output,
    };
    generator.run(&mut reporter);
    Ok(())
}
