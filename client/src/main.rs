use anyhow::Context;
use clap::{Parser, Subcommand};
use safetrackcore::alert::RelayOutcome;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::ClientConfig;
use workflow::runner::{AlertSummary, ContactsUpdate, Runner};

mod console;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Personal-safety client: live tracking and emergency alerts")]
struct Args {
    /// Load the client config from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow a recorded track (or a synthetic walk) on the console map
    Track {
        /// YAML track to replay instead of the configured synthetic walk
        #[arg(long)]
        track: Option<PathBuf>,
        /// Raise an emergency alert once this many fixes have arrived
        #[arg(long)]
        alert_after: Option<usize>,
        /// Open the mailto link with the desktop mail client
        #[arg(long, default_value_t = false)]
        open_mail: bool,
    },
    /// Raise an emergency alert right away
    Alert {
        #[arg(long)]
        track: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        open_mail: bool,
    },
    /// Show or change the emergency contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
    /// Print the last alert log
    Log,
    /// Host a local relay endpoint for drills
    ServeRelay {
        #[arg(long, default_value = "127.0.0.1:9000")]
        bind: SocketAddr,
        /// Answer every alert with 503
        #[arg(long, default_value_t = false)]
        reject: bool,
    },
}

#[derive(Subcommand)]
enum ContactsAction {
    Show,
    Set {
        /// Comma-separated email recipients
        #[arg(long)]
        emails: Option<String>,
        /// Comma-separated Telegram chat IDs
        #[arg(long)]
        tele_ids: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// Post alerts to the relay backend as well
        #[arg(long)]
        auto_send: Option<bool>,
    },
}

fn print_alert(summary: &AlertSummary) {
    println!(
        "Alert -> mail handoff {}, relay {}",
        if summary.mail_handed_off { "opened" } else { "skipped" },
        match &summary.relay {
            None => "disabled".to_string(),
            Some(RelayOutcome::Delivered(_)) => "delivered".to_string(),
            Some(RelayOutcome::Failed(detail)) => format!("failed ({})", detail),
        }
    );
    println!("{}", summary.log);
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ClientConfig::load_or_default(args.config.as_deref())?;
    let runner = Runner::new(config);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;

    match args.command {
        Command::Track {
            track,
            alert_after,
            open_mail,
        } => {
            let summary =
                runtime.block_on(runner.track(track.as_deref(), alert_after, open_mail))?;
            println!(
                "Tracking run -> fixes {}, location faults {}, alerts {}",
                summary.fixes, summary.metrics.location_faults, summary.metrics.alerts_triggered
            );
            if let Some(alert) = &summary.alert {
                print_alert(alert);
            }
        }
        Command::Alert { track, open_mail } => {
            let summary = runtime.block_on(runner.alert(track.as_deref(), open_mail))?;
            print_alert(&summary);
        }
        Command::Contacts {
            action: ContactsAction::Show,
        } => {
            let contacts = runner.contacts()?;
            println!("{}", serde_json::to_string_pretty(&contacts)?);
        }
        Command::Contacts {
            action:
                ContactsAction::Set {
                    emails,
                    tele_ids,
                    message,
                    auto_send,
                },
        } => {
            let contacts = runner.update_contacts(ContactsUpdate {
                emails,
                tele_ids,
                message,
                auto_send_backend: auto_send,
            })?;
            println!("{}", serde_json::to_string_pretty(&contacts)?);
        }
        Command::Log => println!("{}", runner.last_log()?),
        Command::ServeRelay { bind, reject } => {
            let received = runtime.block_on(runner.serve_relay(bind, reject))?;
            println!("Relay sink stopped after {} alerts.", received);
        }
    }

    Ok(())
}
