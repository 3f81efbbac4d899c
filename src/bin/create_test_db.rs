use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::Duration;

use spendwise::{
    AutomaticExpenseName, Category, EmailAddress, NewAutomaticExpense, NewExpense, YearMonth,
    create_automatic_expense, create_expense, ensure_automatic_expenses_for_month, initialize_db,
    local_today, upsert_user,
};

/// A utility for creating a test database for the Spendwise server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The email address the authenticating proxy will forward when you sign in.
    #[arg(long, short, default_value = "test@example.com")]
    email: String,

    /// The canonical name of the timezone the server runs with, e.g.
    /// "Asia/Kolkata". Expenses dated today use this timezone's date.
    #[arg(long, env = "TIMEZONE")]
    timezone: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {}...", args.email);
    let user = upsert_user(&EmailAddress::new(&args.email)?, Some("Test User"), None, &conn)?;

    let today = local_today(&args.timezone)?;
    let this_month = YearMonth::containing(today);
    let last_month = this_month.previous();

    println!("Creating expenses...");
    let expenses = [
        (120.0, today, Category::Food, Some("Chai and samosa")),
        (450.0, today, Category::Travel, Some("Cab to the office")),
        (2_300.0, today - Duration::days(1), Category::Bills, Some("Electricity")),
        (899.5, last_month.first_day(), Category::Other, None),
        (640.0, last_month.last_day(), Category::Food, Some("Dinner out")),
    ];

    for (amount, date, category, note) in expenses {
        create_expense(user.id, NewExpense::new(amount, date, category, note)?, &conn)?;
    }

    println!("Creating automatic expenses...");
    for (name, amount, category) in [
        ("Rent", 15_000.0, Category::Rent),
        ("Internet", 799.0, Category::Bills),
    ] {
        create_automatic_expense(
            user.id,
            NewAutomaticExpense::new(AutomaticExpenseName::new(name)?, amount, category)?,
            last_month,
            &conn,
        )?;
    }

    for month in [last_month, this_month] {
        let report = ensure_automatic_expenses_for_month(user.id, month, &conn)?;
        println!(
            "Created {} automatic expenses for {}",
            report.created,
            month.display_name()
        );
    }

    println!("Success!");

    Ok(())
}
