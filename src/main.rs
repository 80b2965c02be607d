//! # postpack CLI
//!
//! Command-line interface for the postpack library.

use std::fs;
use std::process;
use std::time::Instant;

use clap::Parser;

use postpack::ExportError;
use postpack::cli::Args;
use postpack::core::{Pipeline, write_csv, write_html};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ExportError> {
    let total_start = Instant::now();
    let args = Args::parse();
    let layout = args.output_layout();
    let config = args.export_config();

    println!("📦 postpack v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:   {}", args.input.display());
    println!("💾 Output:  {}", layout.root.display());
    println!("📄 CSV:     {}", layout.csv_path().display());
    println!("🔃 Order:   {}", config.order);
    println!();

    fs::create_dir_all(&layout.root).map_err(|e| ExportError::output_dir(&layout.root, e))?;
    let csv_path = layout.csv_path();
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ExportError::output_dir(parent, e))?;
    }

    println!("⏳ Reading archives and copying photos...");
    let extract_start = Instant::now();
    let extraction = Pipeline::new(config).run(&args.input, &layout.photos_dir())?;
    println!(
        "   Found {} posts ({:.2}s)",
        extraction.records.len(),
        extract_start.elapsed().as_secs_f64()
    );

    println!("💾 Writing CSV...");
    write_csv(&extraction.records, &csv_path)?;

    println!("🌐 Writing HTML...");
    write_html(
        &extraction.records,
        &args.site_options(&layout),
        &layout.html_path(),
    )?;

    println!();
    println!("✅ Done! Open {} in a browser", layout.html_path().display());

    let summary = &extraction.summary;
    println!();
    println!("📊 Summary:");
    for line in summary.to_string().lines() {
        println!("   {line}");
    }

    if !summary.issues.is_empty() {
        println!();
        println!("⚠️  Skipped:");
        println!("   {} archive problem(s)", summary.archive_issues());
        println!("   {} record problem(s)", summary.record_issues());
        println!("   {} missing photo(s)", summary.photo_issues());
        println!("   See the warnings above for details");
    }

    println!();
    println!("⚡ Total time: {:.2}s", total_start.elapsed().as_secs_f64());

    Ok(())
}
