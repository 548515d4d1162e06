use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fintracker::analytics::{self, CategoryFilter};
use fintracker::forms::{ExpenseForm, PasswordForm, ProfileForm, SignInForm, SignUpForm};
use fintracker::{
    export, logging, session, ApiError, Category, Expense, FinanceApi, LocalStore, Session,
    Settings, Theme, GENERIC_FAILURE,
};

#[derive(Parser)]
#[command(name = "fintracker", version, about = "Personal finance tracker for the terminal", long_about = None)]
struct Args {
    /// TOML settings file (defaults to ./fintracker.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive terminal UI (default)
    Ui,
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List expenses
    List {
        #[arg(long)]
        category: Option<CategoryFilter>,
        /// YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
    /// Add an expense or income entry
    Add {
        amount: String,
        #[arg(long, default_value = "Food")]
        category: Category,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Change fields of an existing entry
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Dashboard figures and per-category totals
    Summary {
        #[arg(long)]
        category: Option<CategoryFilter>,
    },
    /// Show or change notification preferences
    Prefs {
        /// key=value, e.g. weeklySummary=true
        #[arg(long = "set")]
        set: Vec<String>,
    },
    /// Show or edit the profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Upload a profile photo
    Photo { path: PathBuf },
    /// Change the account password
    Password {
        #[arg(long)]
        current: Option<String>,
        #[arg(long)]
        new: Option<String>,
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Show the notification feed
    Notifications {
        #[arg(long)]
        mark_read: bool,
    },
    /// Show or set the colour theme: dark, light or toggle
    Theme { mode: Option<String> },
    /// Write expenses to a CSV file
    Export {
        file: PathBuf,
        #[arg(long)]
        category: Option<CategoryFilter>,
        /// YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        eprintln!("❌ {}", err);
        std::process::exit(1);
    }
}

/// Server message when there is one, otherwise the operation's fallback text.
fn fail(err: ApiError, fallback: &str) -> anyhow::Error {
    tracing::warn!("command failed: {}", err);
    anyhow!(err.user_message(fallback))
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref(), args.api_url.as_deref())
        .context("Failed to load settings")?;
    let _log_guard = logging::init(&settings).context("Failed to initialize logging")?;
    tracing::info!("fintracker {} starting against {}", fintracker::VERSION, settings.api_url);

    let store = LocalStore::open(&settings.store_path()).context("Failed to open local storage")?;
    let api = FinanceApi::new(&settings.api_url, Duration::from_secs(settings.request_timeout_secs))
        .context("Failed to build HTTP client")?;
    let session = Arc::new(Session::new(api, store));

    match args.command.unwrap_or(Cmd::Ui) {
        Cmd::Ui => run_ui_mode(session, &settings),

        Cmd::Signup { name, email, password, confirm_password } => {
            let password = secret_or_prompt(password, "Password")?;
            let confirm_password = secret_or_prompt(confirm_password, "Confirm password")?;
            let form = SignUpForm { name, email, password, confirm_password };
            let message = session.sign_up(&form).await.map_err(|e| fail(e, GENERIC_FAILURE))?;
            println!("✓ {}", message);
            println!("  Sign in with: fintracker login --email {}", form.email.trim());
            Ok(())
        }

        Cmd::Login { email, password } => {
            let password = secret_or_prompt(password, "Password")?;
            let form = SignInForm { email, password };
            let user = session.sign_in(&form).await.map_err(|e| fail(e, GENERIC_FAILURE))?;
            println!("✓ {}", session::SIGNED_IN);
            println!("  Welcome, {}", user.name);
            Ok(())
        }

        Cmd::Logout => {
            session.sign_out().map_err(|e| fail(e, GENERIC_FAILURE))?;
            println!("✓ Signed out");
            Ok(())
        }

        Cmd::Whoami => {
            match session.current_user().filter(|_| session.is_signed_in()) {
                Some(user) => {
                    println!("{} <{}>", user.name, user.email);
                    if let Some(photo) = user.photo_location(session.api_url()) {
                        println!("Photo: {}", photo);
                    }
                }
                None => println!("Not signed in"),
            }
            Ok(())
        }

        Cmd::List { category, month } => {
            let expenses = load_expenses(&session).await?;
            let selected = select(&expenses, category.unwrap_or_default(), month.as_deref())?;

            println!("{:<26} {:<14} {:<14} {:>16}  Notes", "Id", "Date", "Category", "Amount");
            for e in &selected {
                println!(
                    "{:<26} {:<14} {:<14} {:>16}  {}",
                    e.id,
                    analytics::format_date(&e.date),
                    e.category,
                    analytics::format_amount(e.amount, &settings.currency_symbol),
                    e.notes
                );
            }
            println!("\n{} of {} entries", selected.len(), expenses.len());
            Ok(())
        }

        Cmd::Add { amount, category, date, notes } => {
            let form = ExpenseForm {
                amount,
                category,
                date: date.unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
                notes,
            };
            let draft = form.to_draft().map_err(|e| fail(e, GENERIC_FAILURE))?;
            let message = session.add_expense(&draft).await.map_err(|e| fail(e, GENERIC_FAILURE))?;
            println!("✓ {}", message);
            Ok(())
        }

        Cmd::Edit { id, amount, category, date, notes } => {
            let expenses = load_expenses(&session).await?;
            let current = expenses
                .iter()
                .find(|e| e.id == id)
                .ok_or_else(|| anyhow!("No expense with id {}", id))?;

            let mut form = ExpenseForm::from_expense(current);
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if let Some(category) = category {
                form.category = category;
            }
            if let Some(date) = date {
                form.date = date;
            }
            if let Some(notes) = notes {
                form.notes = notes;
            }

            let draft = form.to_draft().map_err(|e| fail(e, session::UPDATE_FAILED))?;
            let message = session
                .update_expense(&id, &draft)
                .await
                .map_err(|e| fail(e, session::UPDATE_FAILED))?;
            println!("✓ {}", message);
            Ok(())
        }

        Cmd::Delete { id } => {
            let message = session
                .delete_expense(&id)
                .await
                .map_err(|e| fail(e, session::DELETE_FAILED))?;
            println!("✓ {}", message);
            Ok(())
        }

        Cmd::Summary { category } => {
            let expenses = load_expenses(&session).await?;
            print_summary(&expenses, &category.unwrap_or_default(), &settings.currency_symbol);
            Ok(())
        }

        Cmd::Prefs { set } => {
            let mut prefs = session
                .notification_prefs()
                .await
                .map_err(|e| fail(e, session::LOAD_FAILED))?;

            if !set.is_empty() {
                for pair in &set {
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow!("Expected key=value, got {}", pair))?;
                    let value: bool = value
                        .trim()
                        .parse()
                        .map_err(|_| anyhow!("{} must be true or false", key))?;
                    if !prefs.set(key.trim(), value) {
                        bail!("Unknown preference {}", key);
                    }
                }
                let update = session
                    .update_notification_prefs(&prefs)
                    .await
                    .map_err(|e| fail(e, session::PREFS_FAILED))?;
                prefs = update.prefs;
                println!(
                    "✓ {}",
                    update.message.unwrap_or_else(|| session::PREFS_SAVED.to_string())
                );
            }

            for key in fintracker::NotificationPrefs::KEYS {
                println!("{:<20} {}", key, prefs.get(key).unwrap_or(false));
            }
            Ok(())
        }

        Cmd::Profile { name, email } => {
            if name.is_none() && email.is_none() {
                let user = session
                    .current_user()
                    .ok_or_else(|| anyhow!("Please sign in first."))?;
                println!("Name:  {}", user.name);
                println!("Email: {}", user.email);
                return Ok(());
            }

            let mut form = session.current_user().map(|u| ProfileForm::from_user(&u)).unwrap_or_default();
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(email) = email {
                form.email = email;
            }
            let (user, message) = session
                .edit_profile(&form)
                .await
                .map_err(|e| fail(e, session::PROFILE_FAILED))?;
            println!("✓ {}", message);
            println!("  {} <{}>", user.name, user.email);
            Ok(())
        }

        Cmd::Photo { path } => {
            let (user, message) = session
                .upload_photo(&path)
                .await
                .map_err(|e| fail(e, session::PHOTO_FAILED))?;
            println!("✓ {}", message);
            if let Some(photo) = user.photo_location(session.api_url()) {
                println!("  {}", photo);
            }
            Ok(())
        }

        Cmd::Password { current, new, confirm } => {
            let mut form = PasswordForm {
                current_password: secret_or_prompt(current, "Current password")?,
                new_password: secret_or_prompt(new, "New password")?,
                confirm_password: secret_or_prompt(confirm, "Confirm new password")?,
            };
            let result = session.change_password(&form).await;
            form.clear();
            let message = result.map_err(|e| fail(e, session::PASSWORD_FAILED))?;
            println!("✓ {}", message);
            Ok(())
        }

        Cmd::Notifications { mark_read } => {
            let list = session
                .notifications()
                .await
                .map_err(|e| fail(e, session::LOAD_FAILED))?;
            for n in &list {
                let marker = if n.read { " " } else { "●" };
                let when = n.created_at.as_deref().map(analytics::format_date).unwrap_or_default();
                println!("{} {}  {}", marker, n.message, when);
            }
            println!("\n{} unread", analytics::unread_count(&list));

            if mark_read {
                let message = session.mark_all_read().await.map_err(|e| fail(e, GENERIC_FAILURE))?;
                println!("✓ {}", message);
            }
            Ok(())
        }

        Cmd::Theme { mode } => {
            let current = session.theme(settings.default_theme);
            let next = match mode.as_deref() {
                None => {
                    println!("{}", current);
                    return Ok(());
                }
                Some("toggle") => current.toggled(),
                Some(raw) => raw.parse::<Theme>().map_err(|e| anyhow!(e))?,
            };
            session.set_theme(next).map_err(|e| fail(e, GENERIC_FAILURE))?;
            println!("✓ Theme set to {}", next);
            Ok(())
        }

        Cmd::Export { file, category, month } => {
            let expenses = load_expenses(&session).await?;
            let selected = select(&expenses, category.unwrap_or_default(), month.as_deref())?;
            let written = export::export_csv(&file, selected)?;
            println!("✓ Exported {} entries to {}", written, file.display());
            Ok(())
        }
    }
}

async fn load_expenses(session: &Session) -> Result<Vec<Expense>> {
    session.expenses().await.map_err(|e| fail(e, session::LOAD_FAILED))
}

/// Category filter, then the optional `YYYY-MM` month.
fn select<'a>(
    expenses: &'a [Expense],
    category: CategoryFilter,
    month: Option<&str>,
) -> Result<Vec<&'a Expense>> {
    let month = match month {
        Some(raw) => {
            Some(analytics::parse_month(raw).ok_or_else(|| anyhow!("Month must look like YYYY-MM"))?)
        }
        None => None,
    };
    Ok(analytics::select(expenses, &category, month))
}

fn print_summary(expenses: &[Expense], filter: &CategoryFilter, symbol: &str) {
    let today = Local::now().date_naive();
    let totals = analytics::totals(expenses);
    let current = analytics::monthly_balance(expenses, today, 0);
    let last = analytics::monthly_balance(expenses, today, 1);

    println!("📊 Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Balance:     {}", analytics::format_amount(totals.net(), symbol));
    println!("Income:      {}", analytics::format_amount(totals.income, symbol));
    println!("Expenses:    {}", analytics::format_amount(totals.expenses, symbol));
    println!(
        "This month:  {}",
        analytics::format_amount(analytics::month_spending(expenses, today.year(), today.month()), symbol)
    );
    println!("vs last month: {:+.1}%", analytics::balance_change(current, last));

    println!("\nBy category ({})", filter.label());
    for row in analytics::category_totals(expenses, filter) {
        println!(
            "  {:<14} {:>16}  ({} entries)",
            row.category,
            analytics::format_amount(row.total, symbol),
            row.count
        );
    }

    println!("\nMonthly spending {}", today.year());
    for month in analytics::monthly_spending(expenses, Some(today.year())) {
        if month.spending > 0.0 {
            println!("  {:<10} {:>16}", month.name, analytics::format_amount(month.spending, symbol));
        }
    }
}

/// Uses the flag when given, otherwise reads one line from stdin.
fn secret_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(feature = "tui")]
fn run_ui_mode(session: Arc<Session>, settings: &Settings) -> Result<()> {
    let user = if session.is_signed_in() {
        session.current_user()
    } else {
        None
    };
    let theme = session.theme(settings.default_theme);
    let mut app = fintracker::App::new(user, theme, &settings.currency_symbol, &settings.api_url);

    let handle = tokio::runtime::Handle::current();
    tokio::task::block_in_place(|| fintracker::ui::run_ui(handle, session, &mut app))?;

    tracing::info!("ui closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_session: Arc<Session>, _settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a subcommand, see: fintracker --help");
    std::process::exit(1);
}
