use safetrackcore::alert::{MailDraft, MailHandoff, Notifier};
use safetrackcore::location::PositionSample;
use safetrackcore::tracking::{MapPresenter, MapView};
use safetrackcore::{SafetyError, SafetyResult};
use std::process::Command;

/// Terminal stand-in for the map, marker and status labels.
pub struct ConsolePresenter;

impl MapPresenter for ConsolePresenter {
    fn set_tracking(&self, active: bool) {
        println!("[MAP] Tracking: {}", if active { "on" } else { "off" });
    }

    fn show_position(&self, sample: &PositionSample) {
        println!(
            "[MAP] {} last update {}",
            sample.coordinate_label(),
            sample.time_label()
        );
    }

    fn show_address(&self, label: &str) {
        println!("[MAP] Address: {}", label);
    }

    fn set_view(&self, view: MapView) {
        log::debug!(
            "map view {:.6},{:.6} zoom {}",
            view.latitude,
            view.longitude,
            view.zoom
        );
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("[ALERT] {}", message);
    }

    fn show_log(&self, log: &str) {
        for line in log.lines() {
            println!("[LOG] {}", line);
        }
    }
}

/// Prints the `mailto:` URI and, when asked, opens it with the desktop handler.
pub struct MailtoLauncher {
    open: bool,
}

impl MailtoLauncher {
    pub fn new(open: bool) -> Self {
        Self { open }
    }
}

fn opener(uri: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(uri);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", uri]);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(uri);
        command
    }
}

impl MailHandoff for MailtoLauncher {
    fn hand_off(&self, draft: &MailDraft) -> SafetyResult<()> {
        let uri = draft.to_mailto_uri();
        println!("[MAIL] {}", uri);
        if self.open {
            opener(&uri)
                .spawn()
                .map_err(|err| SafetyError::MailHandoff(err.to_string()))?;
        }
        Ok(())
    }
}
