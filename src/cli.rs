//! Command-line front end.
//!
//! Each invocation loads the session from the data directory, runs one
//! command against the API and prints the result.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;

use crate::api::{Expense, ExpenseApi, ExpenseUpdate, HttpClient};
use crate::budget::BudgetAlert;
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardView};
use crate::expenses::{ExpenseEditor, ExpenseList};
use crate::format::format_currency;
use crate::session::Session;
use crate::store::FileStore;

pub const USAGE: &str = "\
Usage: expense-tracker <command> [args]

Commands:
  login <username> <password>      Log in and remember the user
  logout                           Forget the logged-in user
  profile                          Show the logged-in user
  list [query...]                  List expenses, optionally filtered
  show <id>                        Show one expense
  add <name> <amount> <description>
                                   Create an expense
  quick-add                        Create a placeholder expense
  edit <id> [--name N] [--amount A] [--description D]
                                   Update an expense
  delete <id>                      Delete an expense
  budget <amount>                  Set the monthly budget
  dashboard [--more N]             Budget summary; --more reveals N extra pages
  help                             Show this message";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Profile,
    List { query: String },
    Show { id: String },
    Add { name: String, amount: String, description: String },
    QuickAdd,
    Edit { id: String, update: ExpenseUpdate },
    Delete { id: String },
    Budget { amount: String },
    Dashboard { extra_pages: usize },
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            return Ok(Self::Help);
        };

        let mut next = |what: &'static str| args.next().ok_or(UsageError::MissingArgument(what));

        let command = match name.as_str() {
            "login" => Self::Login {
                username: next("username")?,
                password: next("password")?,
            },
            "logout" => Self::Logout,
            "profile" | "whoami" => Self::Profile,
            "list" | "ls" => {
                let rest: Vec<String> = args.by_ref().collect();
                Self::List {
                    query: rest.join(" "),
                }
            }
            "show" => Self::Show { id: next("id")? },
            "add" => Self::Add {
                name: next("name")?,
                amount: next("amount")?,
                description: next("description")?,
            },
            "quick-add" => Self::QuickAdd,
            "edit" => {
                let id = next("id")?;
                let mut update = ExpenseUpdate::default();
                while let Some(flag) = args.next() {
                    let slot = match flag.as_str() {
                        "--name" => &mut update.name,
                        "--amount" => &mut update.amount,
                        "--description" => &mut update.description,
                        _ => return Err(UsageError::UnexpectedArgument(flag)),
                    };
                    *slot = Some(args.next().ok_or(UsageError::MissingArgument("flag value"))?);
                }
                Self::Edit { id, update }
            }
            "delete" | "rm" => Self::Delete { id: next("id")? },
            "budget" => Self::Budget {
                amount: next("amount")?,
            },
            "dashboard" => {
                let mut extra_pages = 0;
                while let Some(flag) = args.next() {
                    if flag != "--more" {
                        return Err(UsageError::UnexpectedArgument(flag));
                    }
                    let value = args.next().ok_or(UsageError::MissingArgument("--more"))?;
                    extra_pages = value.parse().map_err(|_| UsageError::InvalidValue {
                        flag: "--more",
                        value,
                    })?;
                }
                Self::Dashboard { extra_pages }
            }
            "help" | "-h" | "--help" => Self::Help,
            _ => return Err(UsageError::UnknownCommand(name)),
        };

        if let Some(extra) = args.next() {
            return Err(UsageError::UnexpectedArgument(extra));
        }
        Ok(command)
    }
}

/// Exit status for malformed arguments.
pub const EXIT_USAGE: i32 = 2;
/// Exit status for a command that failed.
pub const EXIT_FAILURE: i32 = 1;

/// Parse `args`, run the command and return the process exit status.
///
/// Usage errors print the usage text to `err` and return [`EXIT_USAGE`].
/// A failed command prints its user-facing message to `err` and returns
/// [`EXIT_FAILURE`].
pub async fn execute<I, O, E>(args: I, config: &Config, out: &mut O, err: &mut E) -> i32
where
    I: IntoIterator<Item = String>,
    O: Write,
    E: Write,
{
    let command = match Command::parse(args) {
        Ok(command) => command,
        Err(e) => {
            let _ = writeln!(err, "{}\n\n{}", e, USAGE);
            return EXIT_USAGE;
        }
    };

    match run(command, config, out).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!("Command failed: {:#}", e);
            let _ = writeln!(err, "{}", e);
            EXIT_FAILURE
        }
    }
}

/// Execute one command, writing its output to `out`.
pub async fn run<W: Write>(command: Command, config: &Config, out: &mut W) -> anyhow::Result<()> {
    if command == Command::Help {
        writeln!(out, "{}", USAGE)?;
        return Ok(());
    }

    let api: Arc<dyn ExpenseApi> = Arc::new(HttpClient::from_config(config)?);
    let store = Arc::new(FileStore::new(&config.data_dir));
    let mut session = Session::load(store).await;

    match command {
        Command::Help => {}
        Command::Login { username, password } => {
            let user = session.login(api.as_ref(), &username, &password).await?;
            writeln!(out, "Logged in as {}", user.username)?;
        }
        Command::Logout => {
            session.logout().await?;
            writeln!(out, "Logged out")?;
        }
        Command::Profile => match session.user() {
            Some(user) => {
                writeln!(out, "{}", session.display_name().unwrap_or(&user.username))?;
                writeln!(out, "{}", user.username)?;
            }
            None => writeln!(out, "Not logged in")?,
        },
        Command::List { query } => {
            let list = ExpenseList::new(Arc::clone(&api), config.retry);
            let mut events = list.subscribe();
            // Retry status goes to stderr while the refresh is still waiting.
            let printer = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    eprintln!("{}", event.message());
                }
            });

            list.refresh().await;
            printer.abort();

            let state = list.snapshot().await;
            if let Some(error) = &state.error {
                anyhow::bail!("{} ({} to resume)", error, list.retry_label().await);
            }
            let matching = list.search(&query).await;
            if matching.is_empty() {
                if query.trim().is_empty() {
                    writeln!(out, "No expenses yet. Use `quick-add` or `add` to create one.")?;
                } else {
                    writeln!(out, "No expenses match \"{}\"", query.trim())?;
                }
            }
            for expense in &matching {
                writeln!(out, "{}", render_expense_line(expense))?;
            }
        }
        Command::Show { id } => {
            let expense = ExpenseEditor::new(api).load(&id).await?;
            write!(out, "{}", render_expense_detail(&expense))?;
        }
        Command::Add {
            name,
            amount,
            description,
        } => {
            let created = ExpenseEditor::new(api)
                .create(&session, &name, &amount, &description)
                .await?;
            writeln!(out, "Expense created successfully ({})", created.id)?;
        }
        Command::QuickAdd => {
            let created = ExpenseList::new(api, config.retry).quick_add(&session).await?;
            writeln!(out, "{}", render_expense_line(&created))?;
        }
        Command::Edit { id, update } => {
            if update.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let updated = ExpenseEditor::new(api).update(&id, &update).await?;
            write!(out, "{}", render_expense_detail(&updated))?;
        }
        Command::Delete { id } => {
            ExpenseEditor::new(api).delete(&id).await?;
            writeln!(out, "Deleted expense {}", id)?;
        }
        Command::Budget { amount } => {
            let dashboard = Dashboard::new(api);
            dashboard.refresh(&session).await;
            let alert = dashboard.set_budget(&mut session, &amount).await?;
            writeln!(
                out,
                "Monthly budget set to ${}",
                format_currency(session.monthly_budget())
            )?;
            write_alert(out, alert.as_ref())?;
        }
        Command::Dashboard { extra_pages } => {
            if !session.is_logged_in() {
                anyhow::bail!("Not logged in");
            }
            let dashboard = Dashboard::new(api);
            let alert = dashboard.refresh(&session).await;
            for _ in 0..extra_pages {
                if !dashboard.show_more(&session).await {
                    break;
                }
            }
            write!(out, "{}", render_dashboard(&dashboard.view(&session).await))?;
            write_alert(out, alert.as_ref())?;
        }
    }
    Ok(())
}

fn write_alert<W: Write>(out: &mut W, alert: Option<&BudgetAlert>) -> std::io::Result<()> {
    if let Some(alert) = alert {
        writeln!(out, "\n{}: {}", alert.title(), alert.message())?;
    }
    Ok(())
}

fn render_expense_line(expense: &Expense) -> String {
    format!(
        "{:>6}  {:<24} ${:>10}  {}",
        expense.id,
        expense.name,
        format_currency(expense.amount_value()),
        crate::budget::category_key(&expense.name)
    )
}

fn render_expense_detail(expense: &Expense) -> String {
    format!(
        "{}\n  Amount:      ${}\n  Description: {}\n  Created:     {}\n  Id:          {}\n",
        expense.name,
        expense.amount,
        expense.description,
        expense.created_at,
        expense.id
    )
}

fn render_dashboard(view: &DashboardView) -> String {
    let summary = &view.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "Monthly Budget   ${}\n",
        format_currency(summary.monthly_budget)
    ));
    out.push_str(&format!(
        "Total Expenses   ${}\n",
        format_currency(summary.total_spent)
    ));
    out.push_str(&format!(
        "Remaining        ${}\n",
        format_currency(summary.remaining)
    ));
    out.push_str(&format!(
        "{:.0}% of budget used{}\n",
        summary.percent_used(),
        if summary.is_over_budget() { " (over budget)" } else { "" }
    ));

    out.push_str("\nSpending by Category\n");
    for bucket in &view.visible_categories {
        out.push_str(&format!(
            "  {:<20} ${:>10}\n",
            bucket.category,
            format_currency(bucket.total)
        ));
    }
    if view.can_show_more {
        out.push_str(&format!(
            "  ... {} more (use --more)\n",
            summary.categories.len() - view.visible_categories.len()
        ));
    }
    out
}
