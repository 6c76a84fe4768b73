//! Command execution.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use homesuite_core::codec;
use homesuite_core::feeds::{HttpClient, RateTable};
use homesuite_core::models::{sort_for_display, summarize};
use homesuite_core::vault::password_strength;
use homesuite_core::{
    Entity, InventoryItem, PasswordEntry, ProfileId, ProfileStore, Session, TaskItem, Transaction,
    Vault,
};
use std::path::PathBuf;

use crate::cli::{
    Command, ExpenseCommand, FeedArgs, InventoryCommand, RatesCommand, TaskCommand, VaultCommand,
};
use crate::config::Config;

/// Environment variable holding the vault master password.
pub const MASTER_PASSWORD_VAR: &str = "HOMESUITE_MASTER_PASSWORD";

/// One data subdirectory per tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Expenses,
    Inventory,
    Vault,
    Tasks,
}

impl Tool {
    pub fn dir_name(self) -> &'static str {
        match self {
            Tool::Expenses => "expando",
            Tool::Inventory => "resource-radar",
            Tool::Vault => "passfort",
            Tool::Tasks => "taskpilot",
        }
    }
}

pub fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Expenses(cmd) => expenses(cmd, &open_store(config, Tool::Expenses)?),
        Command::Inventory(cmd) => inventory(cmd, &open_store(config, Tool::Inventory)?),
        Command::Vault(cmd) => vault(cmd, config),
        Command::Tasks(cmd) => tasks(cmd, &open_store(config, Tool::Tasks)?),
        Command::Rates(cmd) => rates(cmd, config),
        Command::Feed(args) => feed(args, config),
    }
}

fn store_dir(config: &Config, tool: Tool) -> PathBuf {
    config.data_dir.join(tool.dir_name())
}

fn open_store(config: &Config, tool: Tool) -> Result<ProfileStore> {
    let dir = store_dir(config, tool);
    ProfileStore::open(&dir).with_context(|| format!("Failed to open store: {}", dir.display()))
}

/// Open a second handle on the same directory; a session owns its store.
fn reopen(store: &ProfileStore) -> Result<ProfileStore> {
    let root = store.root();
    ProfileStore::open(root).with_context(|| format!("Failed to open store: {}", root.display()))
}

fn to_utc(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or_else(codec::now, |d| d.and_time(NaiveTime::MIN).and_utc())
}

fn print_profiles<R: Entity>(store: &ProfileStore) -> Result<()> {
    let report = store.load_all::<R>().context("Failed to read profile index")?;
    if report.profiles.is_empty() && report.skipped.is_empty() {
        println!("No profiles yet.");
    }
    for profile in &report.profiles {
        println!(
            "{:>15}  {:<24} {:>5} records  created {}",
            profile.id,
            profile.name,
            profile.records.len(),
            profile.created_at.format("%Y-%m-%d")
        );
    }
    for skipped in &report.skipped {
        eprintln!("{:>15}  (unreadable: {})", skipped.id, skipped.error);
    }
    Ok(())
}

fn create_profile<R: Entity>(store: &ProfileStore, name: &str) -> Result<()> {
    let profile = store
        .create_profile::<R>(name)
        .with_context(|| format!("Failed to create profile {name:?}"))?;
    println!("Created {} ({})", profile.name, profile.id);
    Ok(())
}

fn select<R: Entity>(store: &ProfileStore, id: ProfileId) -> Result<Session<R>> {
    let mut session = Session::new(reopen(store)?);
    session
        .select(id)
        .with_context(|| format!("Failed to load profile {id}"))?;
    Ok(session)
}

fn delete_profile(store: &ProfileStore, id: ProfileId) -> Result<()> {
    store
        .delete_profile(id)
        .with_context(|| format!("Failed to delete profile {id}"))?;
    println!("Deleted {id}");
    Ok(())
}

fn expenses(cmd: ExpenseCommand, store: &ProfileStore) -> Result<()> {
    match cmd {
        ExpenseCommand::Profiles => print_profiles::<Transaction>(store),
        ExpenseCommand::New { name } => create_profile::<Transaction>(store, &name),
        ExpenseCommand::Add {
            profile,
            title,
            amount,
            income,
            category,
            note,
            date,
        } => {
            let mut session = select::<Transaction>(store, profile)?;
            let date = to_utc(date);
            let mut transaction = if income {
                Transaction::income(title, amount, date)
            } else {
                Transaction::expense(title, amount, date)
            };
            transaction.category = category;
            transaction.note = note;
            let id = session.add(transaction).context("Failed to save transaction")?;
            println!("Added transaction {id}");
            Ok(())
        }
        ExpenseCommand::List { profile } => {
            let session = select::<Transaction>(store, profile)?;
            let records = session.records()?;
            for t in records {
                println!(
                    "{:>4}  {}  {:>12}  {:<20} {}",
                    t.id,
                    t.date.format("%Y-%m-%d"),
                    t.signed_amount(),
                    t.title,
                    t.category
                );
            }
            let summary = summarize(records);
            println!(
                "income {}  expenses {}  balance {}",
                summary.income, summary.expenses, summary.balance
            );
            Ok(())
        }
        ExpenseCommand::Remove { profile, id } => {
            let mut session = select::<Transaction>(store, profile)?;
            let removed = session.remove(id).context("Failed to remove transaction")?;
            println!("Removed {}", removed.title);
            Ok(())
        }
        ExpenseCommand::DeleteProfile { profile } => delete_profile(store, profile),
    }
}

fn inventory(cmd: InventoryCommand, store: &ProfileStore) -> Result<()> {
    match cmd {
        InventoryCommand::Profiles => print_profiles::<InventoryItem>(store),
        InventoryCommand::New { name } => create_profile::<InventoryItem>(store, &name),
        InventoryCommand::Add {
            profile,
            name,
            quantity,
            price,
            category,
            location,
            purchased,
            warranty,
        } => {
            let mut session = select::<InventoryItem>(store, profile)?;
            let mut item = InventoryItem::new(name, to_utc(purchased));
            item.quantity = quantity;
            item.purchase_price = price;
            item.category = category;
            item.location = location;
            item.warranty_expires = warranty.map(|d| to_utc(Some(d)));
            let id = session.add(item).context("Failed to save item")?;
            println!("Added item {id}");
            Ok(())
        }
        InventoryCommand::Maintain { profile, id, note } => {
            let mut session = select::<InventoryItem>(store, profile)?;
            session
                .update(id, |item| item.log_maintenance(note))
                .context("Failed to update item")?;
            println!("Logged maintenance for item {id}");
            Ok(())
        }
        InventoryCommand::List { profile } => {
            let session = select::<InventoryItem>(store, profile)?;
            let now = Utc::now();
            for item in session.records()? {
                let warranty = match item.warranty_expires {
                    Some(end) if item.under_warranty(now) => {
                        format!("warranty until {}", end.format("%Y-%m-%d"))
                    }
                    Some(_) => "warranty expired".to_string(),
                    None => "no warranty".to_string(),
                };
                println!(
                    "{:>4}  {:<24} x{:<3} {:>10}  {:<12} {}",
                    item.id, item.name, item.quantity, item.purchase_price, item.location, warranty
                );
                for note in &item.maintenance_history {
                    println!("        - {note}");
                }
            }
            Ok(())
        }
        InventoryCommand::Remove { profile, id } => {
            let mut session = select::<InventoryItem>(store, profile)?;
            let removed = session.remove(id).context("Failed to remove item")?;
            println!("Removed {}", removed.name);
            Ok(())
        }
        InventoryCommand::DeleteProfile { profile } => delete_profile(store, profile),
    }
}

fn master_password() -> Result<String> {
    std::env::var(MASTER_PASSWORD_VAR)
        .with_context(|| format!("Set {MASTER_PASSWORD_VAR} to the vault master password"))
}

fn unlock(config: &Config, id: ProfileId) -> Result<Vault> {
    let store = open_store(config, Tool::Vault)?;
    Vault::open(store, id, &master_password()?, config.kdf_cost())
        .with_context(|| format!("Failed to unlock vault {id}"))
}

fn vault(cmd: VaultCommand, config: &Config) -> Result<()> {
    match cmd {
        VaultCommand::Vaults => print_profiles::<PasswordEntry>(&open_store(config, Tool::Vault)?),
        VaultCommand::New { name } => {
            let store = open_store(config, Tool::Vault)?;
            let vault = Vault::create(store, &name, &master_password()?, config.kdf_cost())
                .with_context(|| format!("Failed to create vault {name:?}"))?;
            let profile = vault.profile()?;
            println!("Created vault {} ({})", profile.name, profile.id);
            Ok(())
        }
        VaultCommand::Add {
            vault,
            title,
            username,
            password,
            url,
        } => {
            let strength = password_strength(&password);
            if strength.is_weak() {
                tracing::warn!("Password for {:?} is {}", title, strength.label());
            }
            let mut vault = unlock(config, vault)?;
            let id = vault
                .add_entry(&title, &username, &password, &url)
                .context("Failed to save entry")?;
            println!("Added entry {id} (strength: {})", strength.label());
            Ok(())
        }
        VaultCommand::List { vault } => {
            let vault = unlock(config, vault)?;
            for entry in vault.entries()? {
                println!(
                    "{:>4}  {:<24} {:<20} {}",
                    entry.id, entry.title, entry.username, entry.url
                );
            }
            Ok(())
        }
        VaultCommand::Search { vault, query } => {
            let vault = unlock(config, vault)?;
            let hits = vault.search(&query)?;
            if hits.is_empty() {
                println!("No matches for {query:?}");
            }
            for hit in hits {
                println!(
                    "{:>4}  {:<24} {:<20} (score {})",
                    hit.entry.id, hit.entry.title, hit.entry.username, hit.score
                );
            }
            Ok(())
        }
        VaultCommand::Reveal { vault, id } => {
            let vault = unlock(config, vault)?;
            println!("{}", vault.reveal(id)?);
            Ok(())
        }
        VaultCommand::Passwd {
            vault,
            id,
            password,
        } => {
            let mut vault = unlock(config, vault)?;
            vault
                .change_password(id, &password)
                .context("Failed to update entry")?;
            println!("Updated entry {id} (strength: {})", password_strength(&password).label());
            Ok(())
        }
        VaultCommand::Remove { vault, id } => {
            let mut vault = unlock(config, vault)?;
            let removed = vault.remove_entry(id).context("Failed to remove entry")?;
            println!("Removed {}", removed.title);
            Ok(())
        }
        VaultCommand::DeleteVault { vault } => {
            // Require the master password before destroying a vault.
            drop(unlock(config, vault)?);
            delete_profile(&open_store(config, Tool::Vault)?, vault)
        }
    }
}

fn tasks(cmd: TaskCommand, store: &ProfileStore) -> Result<()> {
    match cmd {
        TaskCommand::Boards => print_profiles::<TaskItem>(store),
        TaskCommand::New { name } => create_profile::<TaskItem>(store, &name),
        TaskCommand::Add {
            board,
            title,
            description,
            due,
            priority,
            attachments,
        } => {
            let mut session = select::<TaskItem>(store, board)?;
            let mut task = TaskItem::new(title);
            task.description = description;
            task.due = due.map(|d| to_utc(Some(d)));
            task.priority = priority;
            task.attachments = attachments;
            let id = session.add(task).context("Failed to save task")?;
            println!("Added task {id}");
            Ok(())
        }
        TaskCommand::Done { board, id } => {
            let mut session = select::<TaskItem>(store, board)?;
            session
                .update(id, |task| task.completed = true)
                .context("Failed to update task")?;
            println!("Completed task {id}");
            Ok(())
        }
        TaskCommand::List { board } => {
            let session = select::<TaskItem>(store, board)?;
            let mut tasks = session.records()?.to_vec();
            sort_for_display(&mut tasks);
            let now = Utc::now();
            for task in &tasks {
                let mark = if task.completed {
                    "x"
                } else if task.is_overdue(now) {
                    "!"
                } else {
                    " "
                };
                let due = task
                    .due
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!(
                    "[{mark}] {:>4}  p{:<3} {:<10} {}",
                    task.id, task.priority, due, task.title
                );
            }
            Ok(())
        }
        TaskCommand::Remove { board, id } => {
            let mut session = select::<TaskItem>(store, board)?;
            let removed = session.remove(id).context("Failed to remove task")?;
            println!("Removed {}", removed.title);
            Ok(())
        }
        TaskCommand::DeleteBoard { board } => delete_profile(store, board),
    }
}

fn rates(cmd: RatesCommand, config: &Config) -> Result<()> {
    let client = HttpClient::new(config.http_timeout())?;
    let fetch = |url: Option<String>| {
        let url = url.unwrap_or_else(|| config.rates_url.clone());
        client
            .fetch_rates(&url)
            .with_context(|| format!("Failed to fetch exchange rates from {url}"))
    };

    match cmd {
        RatesCommand::Show { url } => {
            for rate in fetch(url)? {
                println!(
                    "{:<4} {:>6} {:<16} {:>10.3}  {}",
                    rate.code, rate.amount, rate.currency, rate.rate, rate.country
                );
            }
            Ok(())
        }
        RatesCommand::Convert {
            amount,
            from,
            to,
            url,
        } => {
            let table = RateTable::new(fetch(url)?);
            let converted = table.convert(amount, &from, &to)?;
            println!(
                "{amount:.2} {} = {converted:.2} {}",
                from.to_uppercase(),
                to.to_uppercase()
            );
            Ok(())
        }
    }
}

fn feed(args: FeedArgs, config: &Config) -> Result<()> {
    let urls = if args.urls.is_empty() {
        config.feeds.clone()
    } else {
        args.urls
    };
    if urls.is_empty() {
        anyhow::bail!("No feed URLs given and none configured");
    }

    let client = HttpClient::new(config.http_timeout())?;
    let mut failures = 0;
    for url in &urls {
        match client.fetch_feed(url) {
            Ok(channel) => {
                println!("== {} ({})", channel.title, channel.link);
                for item in channel.items.iter().take(args.limit) {
                    let date = item.pub_date.as_deref().unwrap_or("");
                    println!("  {} {}", item.title, date);
                    if !item.link.is_empty() {
                        println!("    {}", item.link);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to read feed {}: {}", url, e);
                failures += 1;
            }
        }
    }

    if failures == urls.len() {
        anyhow::bail!("All {} feeds failed", failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn tools_use_separate_directories() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let expenses = open_store(&config, Tool::Expenses).unwrap();
        let tasks = open_store(&config, Tool::Tasks).unwrap();
        assert_ne!(expenses.root(), tasks.root());
        assert!(dir.path().join("expando").is_dir());
        assert!(dir.path().join("taskpilot").is_dir());
    }

    #[test]
    fn expense_commands_persist() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        run(
            Command::Expenses(ExpenseCommand::New {
                name: "Alice".into(),
            }),
            &config,
        )
        .unwrap();

        let store = open_store(&config, Tool::Expenses).unwrap();
        let id = store.list().unwrap()[0].id;
        run(
            Command::Expenses(ExpenseCommand::Add {
                profile: id,
                title: "Coffee".into(),
                amount: "3.50".parse().unwrap(),
                income: false,
                category: "Food".into(),
                note: String::new(),
                date: NaiveDate::from_ymd_opt(2024, 1, 2),
            }),
            &config,
        )
        .unwrap();

        let profile = store.load_profile::<Transaction>(id).unwrap();
        assert_eq!(profile.records.len(), 1);
        assert_eq!(profile.records[0].category, "Food");
        assert_eq!(profile.records[0].date.format("%Y-%m-%d").to_string(), "2024-01-02");
    }

    #[test]
    fn task_done_marks_completed() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let store = open_store(&config, Tool::Tasks).unwrap();
        let board = store.create_profile::<TaskItem>("Home").unwrap().id;

        tasks(
            TaskCommand::Add {
                board,
                title: "Fix sink".into(),
                description: String::new(),
                due: None,
                priority: 2,
                attachments: vec![],
            },
            &store,
        )
        .unwrap();
        tasks(TaskCommand::Done { board, id: 1 }, &store).unwrap();

        let profile = store.load_profile::<TaskItem>(board).unwrap();
        assert!(profile.records[0].completed);
        assert!(tasks(TaskCommand::Done { board, id: 42 }, &store).is_err());
    }

    #[test]
    fn feed_without_urls_fails() {
        let dir = TempDir::new().unwrap();
        let args = FeedArgs {
            urls: vec![],
            limit: 5,
        };
        assert!(feed(args, &test_config(&dir)).is_err());
    }
}
