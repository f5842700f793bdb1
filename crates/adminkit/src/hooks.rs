//! Response hooks for the terminal.

use adminkit_api::ResponseHooks;
use owo_colors::OwoColorize;
use tracing::{debug, info};

/// Prints session and success notices to stderr.
///
/// Error notifications only go to the log: every failed call also fails
/// its command, and the command's diagnostic carries the same message.
#[derive(Debug, Clone)]
pub struct ConsoleHooks {
    color: bool,
    quiet: bool,
    login_url: Option<String>,
}

impl ConsoleHooks {
    pub fn new(color: bool, quiet: bool, login_url: Option<String>) -> Self {
        Self {
            color,
            quiet,
            login_url,
        }
    }

    fn notice(&self, symbol: &str, message: &str, success: bool) {
        if self.quiet {
            return;
        }
        let symbol = match (self.color, success) {
            (false, _) => symbol.to_owned(),
            (true, true) => symbol.green().bold().to_string(),
            (true, false) => symbol.yellow().bold().to_string(),
        };
        eprintln!("{symbol} {message}");
    }
}

impl ResponseHooks for ConsoleHooks {
    fn redirect_to_login(&self) {
        let login = self.login_url.as_deref().unwrap_or("/login");
        info!(login_url = login, "session rejected");
        self.notice("!", &format!("Session rejected, sign in again at {login}"), false);
    }

    fn notify_error(&self, message: &str) {
        debug!("{message}");
    }

    fn notify_success(&self, message: &str) {
        self.notice("✓", message, true);
    }
}
