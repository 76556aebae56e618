use std::io::Write;

use crate::api::{ApiClient, PortfolioRecord};
use crate::editor::AllocationEditor;
use crate::portfolio::{
    draw_allocation_pie, parse_allocation_display, print_comparison_table, print_portfolio_table,
    print_radar_table, weights_from_entries,
};
use crate::tui::{Screen, TuiOutcome, ViewSettings};

use clap::{arg, Command};
use colored::Colorize;
use eyre::{bail, eyre, WrapErr};
use serde::Deserialize;
use serde::Serialize;

mod api;
mod charts;
mod editor;
mod error;
mod portfolio;
mod tui;

#[derive(Serialize, Deserialize)]
struct Config {
    api_url: String,
    currency: String,
    start_date: String,
    initial_investment: f64,
    disabled_components: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5000".to_string(),
            currency: "USD".to_string(),
            start_date: "2015-01-01".to_string(),
            initial_investment: 1000.0,
            disabled_components: Vec::new(),
        }
    }
}

fn cli() -> Command {
    Command::new("trackfolio")
        .about("A terminal client for the portfolio tracker")
        .arg_required_else_help(true)
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(Command::new("list").about("List your portfolios"))
        .subcommand(
            Command::new("dashboard")
                .about("Open the performance dashboard for a portfolio")
                .arg(arg!(<ID> "Portfolio id (see `list`)")),
        )
        .subcommand(
            Command::new("create").about("Create a new portfolio in the interactive editor"),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit an existing portfolio's name and allocation")
                .arg(arg!(<ID> "Portfolio id (see `list`)")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a portfolio")
                .arg(arg!(<ID> "Portfolio id (see `list`)"))
                .arg(arg!(--yes "Skip the confirmation prompt")),
        )
        .subcommand(
            Command::new("share")
                .about("Share a portfolio with another user")
                .arg(arg!(<ID> "Portfolio id (see `list`)"))
                .arg(arg!(<USERNAME> "User to share with")),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare two portfolios side by side")
                .arg(arg!(<ID_A> "First portfolio id"))
                .arg(arg!(<ID_B> "Second portfolio id"))
                .arg(arg!(--"no-tui" "Print the tables only, skip the chart view")),
        )
}

fn parse_id(matches: &clap::ArgMatches, name: &str) -> eyre::Result<i64> {
    let raw: &String = matches
        .get_one(name)
        .ok_or_else(|| eyre!("missing {name}"))?;
    raw.parse::<i64>()
        .wrap_err_with(|| format!("'{raw}' is not a portfolio id"))
}

async fn fetch_record(client: &ApiClient, portfolio_id: i64) -> eyre::Result<PortfolioRecord> {
    let records = client.list_portfolios().await?;
    portfolio::find_record(&records, portfolio_id)
        .cloned()
        .ok_or_else(|| eyre!("No portfolio with id {portfolio_id}; run `trackfolio list`"))
}

fn confirm(prompt: &str) -> eyre::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cfg: Config = confy::load("trackfolio", "config")?;
    let client = ApiClient::new(&cfg.api_url);
    let settings = ViewSettings {
        currency: cfg.currency.clone(),
        start_date: cfg.start_date.clone(),
        initial_investment: cfg.initial_investment,
        disabled_components: cfg.disabled_components.clone(),
    };

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("config", _)) => {
            println!(
                "Your config file is located here: \n{}",
                confy::get_configuration_file_path("trackfolio", "config")?.display()
            );
        }
        Some(("list", _)) => {
            let records = client.list_portfolios().await?;
            if records.is_empty() {
                println!("No portfolios yet. Run `trackfolio create` to add one.");
            } else {
                print_portfolio_table(&records);
            }
        }
        Some(("dashboard", sub)) => {
            let portfolio_id = parse_id(sub, "ID")?;
            let record = fetch_record(&client, portfolio_id).await?;
            tui::run(Screen::Dashboard { client, record }, &settings).await?;
        }
        Some(("create", _)) => {
            let catalog = client.assets().await?;
            if catalog.is_empty() {
                bail!("The backend returned an empty asset catalog");
            }
            let editor = AllocationEditor::new(catalog);
            match tui::run(Screen::Editor { editor }, &settings).await? {
                TuiOutcome::Submitted(fields) => {
                    client.create_portfolio(&fields).await?;
                    println!("{}", "Portfolio created".green());
                }
                TuiOutcome::Closed => println!("Cancelled, nothing saved."),
            }
        }
        Some(("edit", sub)) => {
            let portfolio_id = parse_id(sub, "ID")?;
            let record = fetch_record(&client, portfolio_id).await?;
            if !record.is_editable {
                bail!("'{}' is not editable", record.portfolio_name);
            }
            let catalog = client.assets().await?;
            let mut editor = AllocationEditor::new(catalog);
            editor.seed(
                &record.portfolio_name,
                &parse_allocation_display(&record.allocation),
            );
            match tui::run(Screen::Editor { editor }, &settings).await? {
                TuiOutcome::Submitted(fields) => {
                    client.update_portfolio(portfolio_id, &fields).await?;
                    println!("{}", "Portfolio updated".green());
                }
                TuiOutcome::Closed => println!("Cancelled, nothing saved."),
            }
        }
        Some(("delete", sub)) => {
            let portfolio_id = parse_id(sub, "ID")?;
            let record = fetch_record(&client, portfolio_id).await?;
            let go_ahead = sub.get_flag("yes")
                || confirm(&format!("Delete portfolio '{}'?", record.portfolio_name))?;
            if go_ahead {
                client.delete_portfolio(portfolio_id).await?;
                println!("{}", "Portfolio deleted".green());
            } else {
                println!("Cancelled, nothing deleted.");
            }
        }
        Some(("share", sub)) => {
            let portfolio_id = parse_id(sub, "ID")?;
            let username: &String = sub
                .get_one("USERNAME")
                .ok_or_else(|| eyre!("missing USERNAME"))?;
            let record = fetch_record(&client, portfolio_id).await?;
            if !record.is_shareable {
                bail!("'{}' cannot be shared", record.portfolio_name);
            }
            client.share_portfolio(portfolio_id, username).await?;
            println!(
                "{}",
                format!("Shared '{}' with {username}", record.portfolio_name).green()
            );
        }
        Some(("compare", sub)) => {
            let id_a = parse_id(sub, "ID_A")?;
            let id_b = parse_id(sub, "ID_B")?;
            let records = client.list_portfolios().await?;
            let record_a = portfolio::find_record(&records, id_a)
                .cloned()
                .ok_or_else(|| eyre!("No portfolio with id {id_a}; run `trackfolio list`"))?;
            let record_b = portfolio::find_record(&records, id_b)
                .cloned()
                .ok_or_else(|| eyre!("No portfolio with id {id_b}; run `trackfolio list`"))?;

            let entries_a = parse_allocation_display(&record_a.allocation);
            let entries_b = parse_allocation_display(&record_b.allocation);
            let weights_a = weights_from_entries(&entries_a);
            let weights_b = weights_from_entries(&entries_b);

            // both summaries and the radar in one round trip
            let (summary_a, summary_b, radar) = futures::try_join!(
                client.portfolio_summary(&weights_a, &cfg.start_date, cfg.initial_investment),
                client.portfolio_summary(&weights_b, &cfg.start_date, cfg.initial_investment),
                client.comparison_radar(
                    &weights_a,
                    &weights_b,
                    &cfg.start_date,
                    cfg.initial_investment
                ),
            )?;

            print_comparison_table(
                &record_a.portfolio_name,
                &record_b.portfolio_name,
                &summary_a,
                &summary_b,
            );
            print_radar_table(
                &record_a.portfolio_name,
                &record_b.portfolio_name,
                &radar.portfolio_a,
                &radar.portfolio_b,
            );
            draw_allocation_pie(&record_a.portfolio_name, &entries_a);
            draw_allocation_pie(&record_b.portfolio_name, &entries_b);

            if !sub.get_flag("no-tui") {
                tui::run(
                    Screen::Compare {
                        client,
                        record_a,
                        record_b,
                    },
                    &settings,
                )
                .await?;
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        let matches = cli().get_matches_from(vec!["trackfolio", "dashboard", "3"]);
        assert_eq!(matches.subcommand_name(), Some("dashboard"));
        let sub = matches.subcommand_matches("dashboard").unwrap();
        assert_eq!(parse_id(sub, "ID").unwrap(), 3);
    }

    #[test]
    fn test_cli_compare_flags() {
        let matches =
            cli().get_matches_from(vec!["trackfolio", "compare", "1", "2", "--no-tui"]);
        let sub = matches.subcommand_matches("compare").unwrap();
        assert_eq!(parse_id(sub, "ID_A").unwrap(), 1);
        assert_eq!(parse_id(sub, "ID_B").unwrap(), 2);
        assert!(sub.get_flag("no-tui"));
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let matches = cli().get_matches_from(vec!["trackfolio", "delete", "abc"]);
        let sub = matches.subcommand_matches("delete").unwrap();
        assert!(parse_id(sub, "ID").is_err());
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.start_date, "2015-01-01");
        assert_eq!(cfg.initial_investment, 1000.0);
        assert!(cfg.disabled_components.is_empty());
    }
}
