mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Commands, PlaceArgs};
use namefill_rs::{field_listing, logging, FillMethod, FormFiller, Locator, LocatorConfig};

fn filler_for(place: &PlaceArgs) -> Result<FormFiller> {
  let config = match &place.config {
    Some(path) => LocatorConfig::from_file(path)?,
    None => LocatorConfig::default(),
  };
  Ok(FormFiller::new(Locator::new(config)))
}

fn read_input(place: &PlaceArgs) -> Result<Vec<u8>> {
  if place.name.trim().is_empty() {
    bail!("no name provided");
  }
  std::fs::read(&place.input).with_context(|| format!("failed to read {}", place.input.display()))
}

async fn run(args: Args) -> Result<()> {
  match args.command {
    Commands::Version => {
      println!("namefill {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Fields { input } => {
      let bytes = std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
      let listing = field_listing(&bytes)?;
      println!("{}", serde_json::to_string_pretty(&listing)?);
    }
    Commands::Locate { place } => {
      let bytes = read_input(&place)?;
      let placement = filler_for(&place)?.locate(&bytes, place.page, place.name.trim()).await?;
      println!("{}", serde_json::to_string_pretty(&placement)?);
    }
    Commands::Fill { place, output } => {
      let bytes = read_input(&place)?;
      let outcome = filler_for(&place)?.fill(&bytes, place.page, &place.name).await?;
      std::fs::write(&output, &outcome.pdf).with_context(|| format!("failed to write {}", output.display()))?;
      match &outcome.method {
        FillMethod::FormField { field } => println!("Filled form field \"{}\" -> {}", field, output.display()),
        FillMethod::Stamped(placement) => println!(
          "Placed text at ({:.1}, {:.1}) size {} using {} -> {}",
          placement.instruction.x,
          placement.instruction.y,
          placement.instruction.font_size,
          placement.region.strategy,
          output.display()
        ),
      }
    }
  }
  Ok(())
}

#[tokio::main]
async fn main() {
  let args = Args::parse();
  if let Err(e) = logging::init(args.verbose) {
    eprintln!("Error: {}", e);
  }

  if let Err(e) = run(args).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
