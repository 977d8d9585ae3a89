mod cli;

use anyhow::Result;

use crate::db::Database;

pub(crate) fn as_cli(args: &[String], db: &Database) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "summary" | "s" => cli::summary(&args[2..], db),
        "chart" => cli::chart(&args[2..], db),
        "payees" => cli::payees(&args[2..], db),
        "detail" => cli::detail(&args[2..], db),
        "categories" => cli::categories(&args[2..], db),
        "assign" => cli::assign(&args[2..], db),
        "rates" => cli::rates_status(),
        "example" => cli::example(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendview {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("SpendView — local-only bank-export categorizer");
    println!();
    println!("Usage: spendview <command>");
    println!();
    println!("Commands:");
    println!("  summary <file.csv>            Payee, category and net totals for an export");
    println!("    --currency <code>           Display currency (CZK, EUR, USD, GBP, PLN)");
    println!("    --all                       List every raw payee name, no deduplication");
    println!("  chart <file.csv>              Cumulative per-category series, chart-ready");
    println!("    --currency <code>           Display currency");
    println!("  payees <file.csv>             Payees with their individual transactions");
    println!("    --all                       No deduplication");
    println!("  detail <file.csv> <category>  Transactions of one category");
    println!("    --currency <code>           Display currency");
    println!("  categories                    List categories");
    println!("  categories add <name>         Create a category");
    println!("    --display <name>            Display name (defaults to <name>)");
    println!("    --color <css-color>         Chart color");
    println!("  categories remove <id>        Delete a category (the last one is kept)");
    println!("  categories rename <id> <name> Change a category's display name");
    println!("  categories recolor <id> <color>");
    println!("  assign <payee> <category>     Pin a payee to a category");
    println!("  rates                         Show the active exchange-rate table");
    println!("  example                       Run summary over the bundled example export");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}
