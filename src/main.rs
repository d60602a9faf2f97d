//! LaunchLens: sales and new-product launch analytics CLI
//!
//! This is the main entrypoint that orchestrates configuration, data loading,
//! filtering, report printing and export.

use anyhow::Result;
use clap::Parser;
use launchlens::{
    report, Args, DataOrigin, DatasetCache, FilterOptions, FilteredDataset,
};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.verbose {
        println!("LaunchLens - Sales & New Product Analytics");
        println!("==========================================\n");
    }

    run_dashboard(&args)
}

fn run_dashboard(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.resolve_config()?;
    let filters = args.filters();

    // Step 1: Load and normalize the sales sheet
    if args.verbose {
        println!("Step 1: Loading sales data");
        println!("  Input file: {}", config.default_input.display());
    }

    let mut cache = DatasetCache::new();
    let load_start = Instant::now();
    let (input_key, outcome) = cache.load_path(&config.default_input);
    let load_time = load_start.elapsed();

    match outcome.origin {
        DataOrigin::File => println!("✓ Data loaded: {} rows", outcome.table.len()),
        DataOrigin::Sample => println!(
            "✓ Using built-in sample data: {} rows",
            outcome.table.len()
        ),
    }
    if args.verbose {
        println!("  Loading time: {:.2}s", load_time.as_secs_f64());
        let options = FilterOptions::from_table(&outcome.table);
        println!("  Regions: {}", options.regions.join(", "));
        println!("  Applicants: {}", options.applicants.join(", "));
        println!("  Customers: {}", options.customers.len());
        println!("  Products: {}", options.products.len());
    }

    // Step 2: Apply filters
    let dataset = FilteredDataset::new(&outcome.table, &filters, &config.new_product_set());
    if !filters.is_unrestricted() {
        println!(
            "✓ Filters applied: {} of {} rows kept",
            dataset.table.len(),
            outcome.table.len()
        );
    }
    log::debug!("filter fingerprint: {}", filters.fingerprint());

    // Step 3: Report sections
    report::print_all(&dataset, config.top_k, config.top_acceptance);

    // Step 4: Export
    if let Some(ref dir) = args.output {
        let export_start = Instant::now();
        let bundle = cache.export(&input_key, &filters, &dataset)?;
        let written = bundle.write_to_dir(dir)?;
        println!("\n✓ Exported {} sheets to {}", written.len(), dir.display());
        if args.verbose {
            for path in &written {
                println!("  {}", path.display());
            }
            println!(
                "  Export time: {:.2}s",
                export_start.elapsed().as_secs_f64()
            );
        }
    }

    println!("\n=== Dashboard Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
