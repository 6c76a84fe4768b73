//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use homesuite_core::{Amount, ProfileId};
use std::path::PathBuf;

/// homesuite - personal finance, inventory, passwords, tasks, rates and feeds
#[derive(Parser, Debug)]
#[command(name = "homesuite", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Income and expense tracking (Expando)
    #[command(subcommand)]
    Expenses(ExpenseCommand),

    /// Household inventory (ResourceRadar)
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Encrypted password vaults (PassFort)
    #[command(subcommand)]
    Vault(VaultCommand),

    /// Task boards (TaskPilot)
    #[command(subcommand)]
    Tasks(TaskCommand),

    /// Exchange rates
    #[command(subcommand)]
    Rates(RatesCommand),

    /// Read RSS feeds
    Feed(FeedArgs),
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// List all expense profiles
    Profiles,
    /// Create a profile
    New { name: String },
    /// Record a transaction
    Add {
        profile: ProfileId,
        title: String,
        amount: Amount,
        /// Record as income instead of an expense
        #[arg(long)]
        income: bool,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        note: String,
        /// Transaction date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a profile's transactions and balance
    List { profile: ProfileId },
    /// Remove a transaction
    Remove { profile: ProfileId, id: u64 },
    /// Delete a profile and all its data
    DeleteProfile { profile: ProfileId },
}

#[derive(Subcommand, Debug)]
pub enum InventoryCommand {
    /// List all inventory profiles
    Profiles,
    /// Create a profile
    New { name: String },
    /// Add an item
    Add {
        profile: ProfileId,
        name: String,
        #[arg(long, default_value_t = 1)]
        quantity: i32,
        #[arg(long, default_value = "0")]
        price: Amount,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Purchase date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        purchased: Option<NaiveDate>,
        /// Warranty end date (YYYY-MM-DD)
        #[arg(long)]
        warranty: Option<NaiveDate>,
    },
    /// Append a maintenance note to an item
    Maintain {
        profile: ProfileId,
        id: u64,
        note: String,
    },
    /// Show a profile's items
    List { profile: ProfileId },
    /// Remove an item
    Remove { profile: ProfileId, id: u64 },
    /// Delete a profile and all its data
    DeleteProfile { profile: ProfileId },
}

/// Vault commands read the master password from `HOMESUITE_MASTER_PASSWORD`.
#[derive(Subcommand, Debug)]
pub enum VaultCommand {
    /// List all vaults
    Vaults,
    /// Create a vault
    New { name: String },
    /// Store a password
    Add {
        vault: ProfileId,
        title: String,
        username: String,
        password: String,
        #[arg(long, default_value = "")]
        url: String,
    },
    /// List entries (passwords stay hidden)
    List { vault: ProfileId },
    /// Fuzzy search entries by title, username and URL
    Search { vault: ProfileId, query: String },
    /// Print the decrypted password of an entry
    Reveal { vault: ProfileId, id: u64 },
    /// Replace the password of an entry
    Passwd {
        vault: ProfileId,
        id: u64,
        password: String,
    },
    /// Remove an entry
    Remove { vault: ProfileId, id: u64 },
    /// Delete a vault and all its entries
    DeleteVault { vault: ProfileId },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List all boards
    Boards,
    /// Create a board
    New { name: String },
    /// Add a task
    Add {
        board: ProfileId,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, default_value_t = 0)]
        priority: i32,
        /// Attach a file path (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },
    /// Mark a task as done
    Done { board: ProfileId, id: u64 },
    /// Show a board's tasks
    List { board: ProfileId },
    /// Remove a task
    Remove { board: ProfileId, id: u64 },
    /// Delete a board and all its tasks
    DeleteBoard { board: ProfileId },
}

#[derive(Subcommand, Debug)]
pub enum RatesCommand {
    /// Print today's rates
    Show {
        /// Rate list URL (overrides config)
        #[arg(long)]
        url: Option<String>,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Rate list URL (overrides config)
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct FeedArgs {
    /// Feed URLs (defaults to the configured feeds)
    pub urls: Vec<String>,

    /// Maximum items to print per feed
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_expense_add() {
        let args = Args::try_parse_from([
            "homesuite",
            "expenses",
            "add",
            "1700000000000",
            "Salary",
            "2500.00",
            "--income",
            "--date",
            "2024-05-01",
        ])
        .unwrap();
        match args.command {
            Command::Expenses(ExpenseCommand::Add {
                profile,
                amount,
                income,
                date,
                ..
            }) => {
                assert_eq!(profile, ProfileId(1_700_000_000_000));
                assert_eq!(amount.to_string(), "2500.00");
                assert!(income);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_amount() {
        assert!(Args::try_parse_from(["homesuite", "expenses", "add", "1", "x", "abc"]).is_err());
    }
}
