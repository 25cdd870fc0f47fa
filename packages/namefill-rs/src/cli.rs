//! Command line arguments backing the `namefill` binary.
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "namefill",
  about = "Fills a name into PDF forms, locating the blank on flattened or scanned pages",
  version
)]
pub struct Args {
  /// Log each detection step to stderr
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Commands,
}

/// Options shared by the commands that place text.
#[derive(ClapArgs, Debug)]
pub struct PlaceArgs {
  /// PDF document to read
  #[arg(long, short = 'i')]
  pub input: PathBuf,

  /// Text to insert
  #[arg(long, short = 'n')]
  pub name: String,

  /// Zero-based page index
  #[arg(long, short = 'p', default_value = "0")]
  pub page: usize,

  /// JSON file overriding detection and layout constants
  #[arg(long, short = 'c')]
  pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// List the AcroForm fields of a document as JSON
  Fields {
    /// PDF document to read
    #[arg(long, short = 'i')]
    input: PathBuf,
  },
  /// Print where the text would be placed, without writing a PDF
  Locate {
    #[command(flatten)]
    place: PlaceArgs,
  },
  /// Fill the text into the document and write the result
  Fill {
    #[command(flatten)]
    place: PlaceArgs,

    /// Where to write the filled PDF
    #[arg(long, short = 'o', default_value = "filled_form.pdf")]
    output: PathBuf,
  },
}
