use anyhow::{Context, Result};
use rusqlite::Connection;
use std::env;
use std::fs;

use car_valuation::{
    count_resale_records, setup_database, ValuationContext, ValuationPaths, VehicleInput,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init()?,
        Some("summary") => run_summary()?,
        Some("predict") => {
            let input_path = args
                .get(2)
                .context("Usage: car-valuation predict <input.json>")?;
            run_predict(input_path)?;
        }
        _ => print_usage(),
    }

    Ok(())
}

fn print_usage() {
    println!("🚗 Used Car Valuation Portal");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  car-valuation init              Create the resale sink database");
    println!("  car-valuation summary           Dataset KPIs and option counts");
    println!("  car-valuation predict <json>    Estimate a resale range for one vehicle");
    println!();
    println!("Web UI: cargo run --bin valuation-server --features server");
}

fn run_init() -> Result<()> {
    let paths = ValuationPaths::from_env();

    println!("🔧 Setting up resale sink database...");
    let conn = Connection::open(&paths.sink_db)?;
    setup_database(&conn)?;
    let count = count_resale_records(&conn)?;

    println!("✓ Database ready at {:?} (WAL mode)", paths.sink_db);
    println!("✓ Existing resale records: {}", count);

    Ok(())
}

fn run_summary() -> Result<()> {
    let paths = ValuationPaths::from_env();

    println!("📂 Loading reference dataset...");
    let ctx = ValuationContext::load(&paths)?;
    let listings = ctx.listings();
    let options = ctx.options();

    let all: Vec<_> = listings.iter().collect();
    let kpis = car_valuation::kpis(&all);

    println!("✓ Loaded {} listings from {:?}", listings.len(), paths.dataset);
    println!();
    println!("📊 Market summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total cars:       {}", kpis.total_cars);
    println!("  Avg price:        {:.2} Lakhs", kpis.avg_price_lakhs);
    println!("  Avg mileage:      {:.1} kmpl", kpis.avg_mileage_kmpl);
    println!("  Brands:           {}", options.brands.len());
    println!("  Models:           {}", options.models.len());
    println!("  RTO states:       {}", options.rto_states.len());
    println!(
        "  Registration:     {} - {}",
        options.year_min, options.year_max
    );

    Ok(())
}

fn run_predict(input_path: &str) -> Result<()> {
    let paths = ValuationPaths::from_env();

    println!("📂 Loading artifacts...");
    let ctx = ValuationContext::load(&paths)?;
    println!("✓ Context ready ({} reference listings)", ctx.listings().len());

    let json = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read input file: {}", input_path))?;
    let input: VehicleInput =
        serde_json::from_str(&json).context("Failed to parse vehicle input JSON")?;

    println!(
        "\n💵 Estimating resale range for {} {} ({})...",
        input.brand, input.model, input.registration_year
    );

    let valuation = ctx.submit(&input)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Estimated Resale Value Range");
    println!("  {}", valuation.display);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match valuation.outcome.warning() {
        None => println!("✓ Prediction recorded to {:?}", paths.sink_db),
        Some(warning) => {
            // Best-effort sink: warn and move on, the range above stands
            eprintln!("⚠ Prediction not recorded: {}", warning);
        }
    }

    Ok(())
}
