//! SafeView CLI
//!
//! CLI tool for checking URLs against a SafeView policy and inspecting its inputs.

use clap::{Parser, Subcommand};

mod check;
mod inputs;

#[derive(Parser, Debug)]
#[command(name = "sv-cli")]
#[command(about = "SafeView navigation policy tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide whether URLs may load under a policy
    Check {
        /// Settings file (appsettings.json)
        #[arg(short, long)]
        settings: Option<String>,

        /// Block list file
        #[arg(short, long)]
        blocklist: Option<String>,

        /// Treat URLs as sub-resource fetches instead of navigations
        #[arg(long)]
        resource: bool,

        /// Treat navigations as sub-frame navigations
        #[arg(long, conflicts_with = "resource")]
        sub_frame: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the resolved policy configuration
    Config {
        /// Settings file (appsettings.json)
        #[arg(short, long)]
        settings: String,
    },

    /// Inspect a block list and optionally test hosts against it
    Blocklist {
        /// Block list file
        #[arg(short, long)]
        input: String,

        /// Hosts to test
        hosts: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            settings,
            blocklist,
            resource,
            sub_frame,
            json,
            urls,
        } => {
            let kind = if resource {
                check::CheckKind::Resource
            } else if sub_frame {
                check::CheckKind::SubFrame
            } else {
                check::CheckKind::MainFrame
            };
            cmd_check(settings.as_deref(), blocklist.as_deref(), kind, json, &urls)
        }
        Commands::Config { settings } => cmd_config(&settings),
        Commands::Blocklist { input, hosts } => cmd_blocklist(&input, &hosts),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_check(
    settings: Option<&str>,
    blocklist: Option<&str>,
    kind: check::CheckKind,
    json: bool,
    urls: &[String],
) -> Result<(), String> {
    let policy = inputs::build_policy(settings, blocklist)?;
    let reports = check::evaluate(&policy, kind, urls);

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    for report in &reports {
        match &report.reason {
            Some(reason) => println!("BLOCK  {}  ({})", report.url, reason),
            None => println!("ALLOW  {}", report.url),
        }
    }

    let blocked = reports.iter().filter(|r| r.decision.is_block()).count();
    println!();
    println!("Checked {} URL(s): {} allowed, {} blocked", reports.len(), reports.len() - blocked, blocked);

    Ok(())
}

fn cmd_config(settings: &str) -> Result<(), String> {
    let settings = inputs::read_settings(settings)?;
    let report = inputs::ConfigReport::resolve(&settings);

    let out = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
    println!("{}", out);

    Ok(())
}

fn cmd_blocklist(input: &str, hosts: &[String]) -> Result<(), String> {
    let set = inputs::read_blocklist(input)?;

    println!("Block list: {}", input);
    println!("  Entries:     {}", set.len());

    if !hosts.is_empty() {
        println!();
        for host in hosts {
            let verdict = if set.is_blocked(host) { "blocked" } else { "not blocked" };
            println!("  {:<40} {}", host, verdict);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_command() {
        let cli = Cli::try_parse_from([
            "sv-cli",
            "check",
            "--settings",
            "appsettings.json",
            "--resource",
            "https://example.com/a.js",
            "https://example.com/b.js",
        ])
        .expect("valid arguments");

        match cli.command {
            Commands::Check {
                settings,
                blocklist,
                resource,
                sub_frame,
                urls,
                ..
            } => {
                assert_eq!(settings.as_deref(), Some("appsettings.json"));
                assert_eq!(blocklist, None);
                assert!(resource);
                assert!(!sub_frame);
                assert_eq!(urls.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_requires_urls() {
        assert!(Cli::try_parse_from(["sv-cli", "check"]).is_err());
    }

    #[test]
    fn resource_conflicts_with_sub_frame() {
        assert!(Cli::try_parse_from(["sv-cli", "check", "--resource", "--sub-frame", "https://example.com"]).is_err());
    }

    #[test]
    fn parses_blocklist_command() {
        let cli = Cli::try_parse_from(["sv-cli", "blocklist", "-i", "blocklist.txt", "ads.example.net"])
            .expect("valid arguments");
        assert!(matches!(cli.command, Commands::Blocklist { ref hosts, .. } if hosts.len() == 1));
    }
}
