use campaign_metrics::*;
use chrono::Local;
use std::env;
use std::fs;

/// Prints the dashboard view for a CSV export as JSON.
///
/// Usage: cargo run --example dashboard_report -- <sheet.csv> [range] [source]
///
/// `range` accepts "6m", "ytd" or "YYYY-MM:YYYY-MM"; `source` is a channel
/// tag or "all".
fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: dashboard_report <sheet.csv> [range] [source]"))?;
    let range: RangeSpec = args.next().as_deref().unwrap_or("6m").parse()?;
    let source = SourceFilter::from(args.next().as_deref().unwrap_or("all"));

    let text = fs::read_to_string(&path)?;
    let records = parse_csv_records(&text, &ParseOptions::default())?;
    println!("Parsed {} records from {}", records.len(), path);

    let query = DashboardQuery {
        range,
        source,
        compare_to: None,
    };
    let view = build_dashboard(&records, &query, Local::now().date_naive());

    println!("{}", serde_json::to_string_pretty(&view)?);

    if let Some(best) = &view.best_month {
        println!("Best month: {} (${:.2} revenue)", best.label, best.revenue);
    }

    Ok(())
}
