//! Command-line parsing and the non-interactive subcommands.
use crate::client::EntryStore;
use crate::controller::{AssumeYes, Confirm, JournalClient, StatusKind};
use crate::model::{display_date, format_date, parse_date};
use crate::network::run_until_idle;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// No subcommand: start the interactive interface.
    Interactive,
    Help,
    Health,
    List,
    Show(NaiveDate),
    Write { date: NaiveDate, text: String },
    Delete { date: NaiveDate, yes: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub api_url: Option<String>,
    pub command: CliCommand,
}

fn date_arg(value: Option<&String>, command: &str) -> Result<NaiveDate> {
    let raw = value.ok_or_else(|| anyhow!("'{}' needs a date (YYYY-MM-DD)", command))?;
    parse_date(raw).ok_or_else(|| anyhow!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Parses `args` without the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut root = None;
    let mut api_url = None;
    let mut positional: Vec<String> = Vec::new();
    let mut yes = false;
    let mut verbatim = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        // Everything after `write <date>` is the entry text, dashes included.
        let in_text = positional.len() >= 2 && positional[0] == "write";
        if verbatim || in_text {
            positional.push(arg.clone());
            continue;
        }
        match arg.as_str() {
            "--" => verbatim = true,
            a if a == "-h" || a == "--help" || (a == "help" && positional.is_empty()) => {
                return Ok(CliArgs {
                    root,
                    api_url,
                    command: CliCommand::Help,
                });
            }
            "-r" | "--root" => {
                let path = iter.next().context("--root needs a path")?;
                root = Some(PathBuf::from(path));
            }
            "--api-url" => {
                api_url = Some(iter.next().context("--api-url needs a URL")?.clone());
            }
            "-y" | "--yes" => yes = true,
            other if other.starts_with('-') && positional.is_empty() => {
                bail!("Unknown option '{}'", other)
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut rest = positional.iter();
    let command = match rest.next().map(String::as_str) {
        None => CliCommand::Interactive,
        Some("health") => CliCommand::Health,
        Some("list") => CliCommand::List,
        Some("show") => CliCommand::Show(date_arg(rest.next(), "show")?),
        Some("write") => {
            let date = date_arg(rest.next(), "write")?;
            let text = rest.cloned().collect::<Vec<_>>().join(" ");
            CliCommand::Write { date, text }
        }
        Some("delete") => CliCommand::Delete {
            date: date_arg(rest.next(), "delete")?,
            yes,
        },
        Some(other) => bail!("Unknown command '{}'. Try --help", other),
    };

    Ok(CliArgs {
        root,
        api_url,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Diario v{} - A personal journal client, one entry per day",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS]                       Start interactive TUI", binary_name);
    println!("    {} health                          Check that the server is reachable", binary_name);
    println!("    {} list                            List all entries, newest first", binary_name);
    println!("    {} show <date>                     Print the entry for a date", binary_name);
    println!("    {} write <date> <text...>          Create or update the entry for a date", binary_name);
    println!("    {} delete <date> [--yes]           Delete the entry for a date", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    --api-url <url>       Journal API base URL (default: config, then $DIARIO_API_URL).");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -y, --yes             Do not ask before deleting.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("Dates use the YYYY-MM-DD format, e.g. {} show 2024-01-15", binary_name);
    println!("Everything after the date of 'write' is the entry text, options included.");
    println!("'--' ends option parsing.");
    println!();
    println!("KEYBINDINGS (TUI):");
    println!("    Tab               Cycle focus: date, editor, entries");
    println!("    Ctrl+S            Save the entry");
    println!("    Ctrl+N            Start a new entry for today");
    println!("    [ / ], Up / Down  Previous / next day (date field)");
    println!("    Enter             Go to the typed YYYY-MM-DD date (date field)");
    println!("    Enter             Open the highlighted entry (entries)");
    println!("    j / k, Up / Down  Move through the entries (entries)");
    println!("    [ / ]             Previous / next day (entries)");
    println!("    d / Delete        Delete the highlighted entry, asks y/n (entries)");
    println!("    r                 Refresh the entries, or retry when disconnected");
    println!("    Esc / q           Quit, asks first if the draft is unsaved (q outside the editor)");
    println!("    Ctrl+C            Quit immediately");
}

/// Reads a y/n answer from stdin. Anything but `y`/`yes` declines.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn fail_on_error_status(client: &JournalClient) -> Result<()> {
    match &client.state().status {
        Some(status) if status.kind == StatusKind::Error => Err(anyhow!(status.text.clone())),
        _ => Ok(()),
    }
}

fn report_status(client: &JournalClient, out: &mut dyn Write) -> Result<()> {
    fail_on_error_status(client)?;
    if let Some(status) = &client.state().status {
        writeln!(out, "{}", status.text)?;
    }
    Ok(())
}

/// Runs one non-interactive command against `store`, writing results to `out`.
pub async fn run_command<S: EntryStore>(
    store: &S,
    command: &CliCommand,
    confirm: &mut dyn Confirm,
    out: &mut dyn Write,
) -> Result<()> {
    let mut client = JournalClient::new();

    match command {
        CliCommand::Interactive | CliCommand::Help => {
            bail!("'{:?}' is not a subcommand", command)
        }
        CliCommand::Health => {
            let cmds = client.probe_connection();
            run_until_idle(&mut client, store, cmds).await;
            if !client.is_connected() {
                bail!("Server is not reachable");
            }
            writeln!(out, "Server is reachable")?;
        }
        CliCommand::List => {
            let cmds = client.load_all_entries();
            run_until_idle(&mut client, store, cmds).await;
            fail_on_error_status(&client)?;
            let entries = &client.state().entries;
            if entries.is_empty() {
                writeln!(out, "No entries yet")?;
            }
            for entry in entries {
                writeln!(out, "{}  {}", format_date(entry.date), entry.preview())?;
            }
        }
        CliCommand::Show(date) => {
            let cmds = client.select_date(*date);
            run_until_idle(&mut client, store, cmds).await;
            fail_on_error_status(&client)?;
            if !client.state().is_editing {
                bail!("No entry for {}", format_date(*date));
            }
            writeln!(out, "{}", display_date(*date))?;
            writeln!(out)?;
            writeln!(out, "{}", client.state().draft_content)?;
        }
        CliCommand::Write { date, text } => {
            let cmds = client.select_date(*date);
            run_until_idle(&mut client, store, cmds).await;
            fail_on_error_status(&client)?;

            client.set_draft(text.as_str());
            let cmds = client.save_entry();
            run_until_idle(&mut client, store, cmds).await;
            report_status(&client, out)?;
        }
        CliCommand::Delete { date, yes } => {
            let cmds = if *yes {
                client.delete_entry(*date, &mut AssumeYes)
            } else {
                client.delete_entry(*date, confirm)
            };
            if cmds.is_empty() {
                writeln!(out, "Cancelled")?;
                return Ok(());
            }
            run_until_idle(&mut client, store, cmds).await;
            report_status(&client, out)?;
        }
    }
    Ok(())
}
