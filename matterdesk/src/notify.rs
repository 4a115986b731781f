//! Blocking notices to the person at the desk.
//!
//! Runs are unattended most of the time, so anything that stops a run or needs a decision
//! is shown as a modal, top-most message box on Windows.

use std::io::{BufRead, Write};
use tracing::{error, info, warn};

pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Asks a yes/no question. Returns true only on an explicit yes.
    fn confirm(&self, message: &str) -> bool;
}

/// Logs notices and asks confirmations on the terminal.
pub struct ConsoleNotifier {
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            info!("{} [auto-confirmed]", message);
            return true;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{message} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui"),
            Err(e) => {
                warn!("could not read confirmation: {}", e);
                false
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use message_box::MessageBoxNotifier;

#[cfg(target_os = "windows")]
mod message_box {
    use super::Notifier;
    use tracing::{error, info, warn};
    use windows::core::HSTRING;
    use windows::Win32::UI::WindowsAndMessaging::{
        MessageBoxW, IDYES, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONQUESTION, MB_ICONWARNING,
        MB_OK, MB_TOPMOST, MB_YESNO, MESSAGEBOX_STYLE,
    };

    /// Native message boxes, owned by no window and kept above the driven application.
    pub struct MessageBoxNotifier {
        title: String,
    }

    impl MessageBoxNotifier {
        pub fn new(title: impl Into<String>) -> Self {
            Self {
                title: title.into(),
            }
        }

        fn show(&self, message: &str, style: MESSAGEBOX_STYLE) -> bool {
            let result = unsafe {
                MessageBoxW(
                    None,
                    &HSTRING::from(message),
                    &HSTRING::from(self.title.as_str()),
                    style | MB_TOPMOST,
                )
            };
            result == IDYES
        }
    }

    impl Notifier for MessageBoxNotifier {
        fn info(&self, message: &str) {
            info!("{}", message);
            self.show(message, MB_OK | MB_ICONINFORMATION);
        }

        fn warning(&self, message: &str) {
            warn!("{}", message);
            self.show(message, MB_OK | MB_ICONWARNING);
        }

        fn error(&self, message: &str) {
            error!("{}", message);
            self.show(message, MB_OK | MB_ICONERROR);
        }

        fn confirm(&self, message: &str) -> bool {
            let yes = self.show(message, MB_YESNO | MB_ICONQUESTION);
            info!("{} -> {}", message, if yes { "yes" } else { "no" });
            yes
        }
    }
}

/// Message boxes on Windows, the terminal elsewhere.
pub fn default_notifier(title: &str, assume_yes: bool) -> Box<dyn Notifier> {
    #[cfg(target_os = "windows")]
    {
        let _ = assume_yes;
        Box::new(MessageBoxNotifier::new(title))
    }
    #[cfg(not(target_os = "windows"))]
    {
        let _ = title;
        Box::new(ConsoleNotifier::new(assume_yes))
    }
}
