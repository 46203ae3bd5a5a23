use anyhow::Result;
use clap::Parser;
use titanic_bayes::{logging, pipeline, Config};

fn main() -> Result<()> {
    logging::init_tracing();

    let config = Config::parse();
    let outcome = pipeline::run(&config)?;

    println!(
        "Binned Age at {:.2} and Fare at {:.2}, alpha = {}",
        outcome.age_threshold,
        outcome.fare_threshold,
        outcome.model.alpha()
    );
    println!("\nTraining set:\n{}", outcome.train_report);
    println!("Test set:\n{}", outcome.test_report);

    Ok(())
}
