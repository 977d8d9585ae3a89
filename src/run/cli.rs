use std::path::Path;

use anyhow::Result;
use rust_decimal::Decimal;

use crate::aggregate;
use crate::categorize::Categorizer;
use crate::db::Database;
use crate::import;
use crate::models::{Category, Currency};
use crate::payee::NameMapping;
use crate::rates::{format_display, ExchangeRates};
use crate::series;

/// Everything a command needs after an export has been read.
struct Pipeline {
    records: Vec<crate::models::TxRecord>,
    mapping: NameMapping,
    categorizer: Categorizer,
    categories: Vec<Category>,
    rates: ExchangeRates,
}

impl Pipeline {
    fn load(text: &str, db: &Database) -> Result<Self> {
        let records = import::parse(text);
        let mapping = NameMapping::build(&records);
        let categories = db.get_categories()?;
        let categorizer = Categorizer::new(db.get_assignments()?, &categories);

        // Best-effort; falls back to the fixed table and never blocks the
        // rest of the pipeline beyond its own timeout.
        let mut rates = ExchangeRates::new();
        rates.refresh();

        Ok(Self {
            records,
            mapping,
            categorizer,
            categories,
            rates,
        })
    }

    fn load_file(path: &str, db: &Database) -> Result<Self> {
        let text = import::read_file(Path::new(path))?;
        Self::load(&text, db)
    }
}

// ── Commands ─────────────────────────────────────────────────

pub(crate) fn summary(args: &[String], db: &Database) -> Result<()> {
    let path = file_arg(args)?;
    let currency = parse_currency(args)?;
    let pipeline = Pipeline::load_file(path, db)?;
    print_summary(&pipeline, currency, !has_flag(args, "--all"), path)
}

pub(crate) fn example(args: &[String], db: &Database) -> Result<()> {
    let currency = parse_currency(args)?;
    let pipeline = Pipeline::load(import::EXAMPLE_CSV, db)?;
    print_summary(&pipeline, currency, !has_flag(args, "--all"), "example data")
}

fn print_summary(
    pipeline: &Pipeline,
    currency: Currency,
    hide_duplicates: bool,
    source: &str,
) -> Result<()> {
    let Pipeline {
        records,
        mapping,
        categorizer,
        categories,
        rates,
    } = pipeline;

    if records.is_empty() {
        println!("No transactions in {source}");
        return Ok(());
    }

    let items = aggregate::unique_items(records, mapping, hide_duplicates);
    let amounts = aggregate::item_amounts(records, mapping, rates, currency, hide_duplicates)?;
    let transactions = aggregate::item_transactions(records, mapping, hide_duplicates);

    println!("SpendView — {source}");
    println!("{}", "─".repeat(72));

    println!("Payees:");
    for item in &items {
        let category_id = categorizer.category_for(mapping.representative(item));
        let amount = amounts
            .get(item)
            .map(|a| format_display(*a, currency))
            .unwrap_or_else(|| "—".into());
        let count = transactions.get(item).map_or(0, Vec::len);
        println!(
            "  {:<40} {:<12} {:>16}  ({count})",
            truncate(item, 40),
            truncate(&Category::pretty_name_for(categories, &category_id), 12),
            amount,
        );
    }

    let categorized = categorizer.categorize(records, mapping);
    let grouped = aggregate::group_by_category(&categorized);

    println!();
    println!("Categories:");
    for (id, group) in &grouped {
        let total =
            aggregate::sum_converted(group.iter().map(|c| &c.record), rates, currency)?;
        println!(
            "  {:<24} {:>16}  ({} transactions)",
            truncate(&Category::pretty_name_for(categories, id), 24),
            format_display(total, currency),
            group.len(),
        );
    }

    let net = aggregate::total_net(records, rates, currency)?;
    println!();
    println!("Total Net: {}", format_display(net, currency));
    println!(
        "Exchange rates: {}",
        if rates.is_live() { "live" } else { "fallback" }
    );
    Ok(())
}

pub(crate) fn chart(args: &[String], db: &Database) -> Result<()> {
    let path = file_arg(args)?;
    let currency = parse_currency(args)?;
    let pipeline = Pipeline::load_file(path, db)?;

    let categorized = pipeline
        .categorizer
        .categorize(&pipeline.records, &pipeline.mapping);
    let grouped = aggregate::group_by_category(&categorized);
    let rows = series::build(&grouped, &pipeline.rates, currency)?;

    if rows.is_empty() {
        println!("No dated transactions to chart");
        return Ok(());
    }

    // Header: category columns appear in every row, so take the first.
    let column_ids: Vec<&String> = rows[0].values.keys().collect();
    print!("{:<12}", "Date");
    for id in &column_ids {
        print!(
            " {:>12}",
            truncate(&Category::pretty_name_for(&pipeline.categories, id), 12)
        );
    }
    println!(" {:>12}", "Total");

    for row in &rows {
        print!("{:<12}", row.date);
        for id in &column_ids {
            let value = row.values.get(*id).copied().unwrap_or(Decimal::ZERO);
            print!(" {:>12}", value.to_string());
        }
        println!(" {:>12}", row.total.to_string());
    }
    Ok(())
}

pub(crate) fn payees(args: &[String], db: &Database) -> Result<()> {
    let path = file_arg(args)?;
    let pipeline = Pipeline::load_file(path, db)?;
    let hide_duplicates = !has_flag(args, "--all");

    let items = aggregate::unique_items(&pipeline.records, &pipeline.mapping, hide_duplicates);
    let transactions =
        aggregate::item_transactions(&pipeline.records, &pipeline.mapping, hide_duplicates);

    for item in &items {
        let category_id = pipeline
            .categorizer
            .category_for(pipeline.mapping.representative(item));
        println!(
            "{item}  [{}]",
            Category::pretty_name_for(&pipeline.categories, &category_id)
        );
        if let Some(group) = transactions.get(item) {
            for rec in group {
                let amount = if rec.has_money() {
                    format!("{} {}", rec.amount, rec.currency)
                } else {
                    "—".into()
                };
                println!("    {:<12} {:>16}  {}", rec.date, amount, rec.tx_type);
            }
        }
    }
    Ok(())
}

pub(crate) fn detail(args: &[String], db: &Database) -> Result<()> {
    let path = file_arg(args)?;
    let category_id = args
        .get(1)
        .filter(|a| !a.starts_with('-'))
        .ok_or_else(|| anyhow::anyhow!("Usage: spendview detail <file.csv> <category>"))?;
    let currency = parse_currency(args)?;
    let pipeline = Pipeline::load_file(path, db)?;

    let categorized = pipeline
        .categorizer
        .categorize(&pipeline.records, &pipeline.mapping);
    let grouped = aggregate::group_by_category(&categorized);
    let Some(group) = grouped.get(category_id.as_str()) else {
        anyhow::bail!("No transactions for category '{category_id}'");
    };

    println!(
        "{} — {} transactions",
        Category::pretty_name_for(&pipeline.categories, category_id),
        group.len()
    );
    println!("{}", "─".repeat(72));
    for rec in group {
        let amount = aggregate::convert_record(&rec.record, &pipeline.rates, currency)?
            .map(|a| format_display(a, currency))
            .unwrap_or_else(|| "—".into());
        println!(
            "  {:<40} {:>16}  {}",
            truncate(&crate::payee::payment_information(&rec.record), 40),
            amount,
            rec.record.date,
        );
    }

    let total = aggregate::sum_converted(
        group.iter().map(|c| &c.record),
        &pipeline.rates,
        currency,
    )?;
    println!("{}", "─".repeat(72));
    println!("  Total: {}", format_display(total, currency));
    Ok(())
}

pub(crate) fn categories(args: &[String], db: &Database) -> Result<()> {
    match args.first().map(String::as_str) {
        None => {
            let cats = db.get_categories()?;
            println!("{:<16} {:<24} Color", "ID", "Name");
            println!("{}", "─".repeat(50));
            for cat in &cats {
                println!("{:<16} {:<24} {}", cat.id, cat.pretty_name, cat.color);
            }
            Ok(())
        }
        Some("add") => {
            let name = required(args, 1, "categories add <name>")?;
            let display = flag_value(args, "--display").unwrap_or("");
            let color = flag_value(args, "--color").unwrap_or("#999999");
            let cat = db.add_category(name, display, color)?;
            println!("Added category '{}' (id: {})", cat.pretty_name, cat.id);
            Ok(())
        }
        Some("remove") => {
            let id = required(args, 1, "categories remove <id>")?;
            db.remove_category(id)?;
            println!("Removed category '{id}'");
            Ok(())
        }
        Some("rename") => {
            let id = required(args, 1, "categories rename <id> <name>")?;
            let name = required(args, 2, "categories rename <id> <name>")?;
            db.rename_category(id, name)?;
            println!("Renamed category '{id}' to '{name}'");
            Ok(())
        }
        Some("recolor") => {
            let id = required(args, 1, "categories recolor <id> <color>")?;
            let color = required(args, 2, "categories recolor <id> <color>")?;
            db.recolor_category(id, color)?;
            println!("Recolored category '{id}' to {color}");
            Ok(())
        }
        Some(other) => anyhow::bail!("Unknown categories subcommand: {other}"),
    }
}

pub(crate) fn assign(args: &[String], db: &Database) -> Result<()> {
    let payee = required(args, 0, "assign <payee> <category>")?;
    let category_id = required(args, 1, "assign <payee> <category>")?;
    if db.get_category(category_id)?.is_none() {
        anyhow::bail!("No such category: {category_id}");
    }
    let payee = payee.trim();
    let previous = db.get_assignment(payee)?;
    db.set_assignment(payee, category_id)?;
    match previous {
        Some(old) if old != *category_id => {
            println!("Assigned '{payee}' to '{category_id}' (was '{old}')");
        }
        _ => println!("Assigned '{payee}' to '{category_id}'"),
    }
    Ok(())
}

pub(crate) fn rates_status() -> Result<()> {
    let mut rates = ExchangeRates::new();
    rates.refresh();
    println!(
        "Exchange rates ({}):",
        if rates.is_live() { "live" } else { "fallback" }
    );
    for currency in Currency::FOREIGN {
        println!("  1 {} = {} CZK", currency.code(), rates.rate(currency).round_dp(4));
    }
    Ok(())
}

// ── Argument helpers ─────────────────────────────────────────

fn file_arg(args: &[String]) -> Result<&String> {
    args.first()
        .filter(|a| !a.starts_with('-'))
        .ok_or_else(|| anyhow::anyhow!("Missing <file.csv> argument"))
}

fn required<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a String> {
    args.get(index)
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow::anyhow!("Usage: spendview {usage}"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_currency(args: &[String]) -> Result<Currency> {
    match flag_value(args, "--currency") {
        Some(code) => Currency::parse(&code.to_uppercase()).ok_or_else(|| {
            let supported: Vec<&str> = Currency::ALL.iter().map(|c| c.code()).collect();
            anyhow::anyhow!(
                "Unsupported currency: {code} (supported: {})",
                supported.join(", ")
            )
        }),
        None => Ok(Currency::Czk),
    }
}

/// Truncate to `max` visible characters, appending "…" when shortened.
/// Safe for multi-byte UTF-8.
fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let shortened: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{shortened}…")
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
