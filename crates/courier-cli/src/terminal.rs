//! Terminal implementations of the presentation ports.

use courier_core::config::{LoadingConfig, MessageConfig};
use courier_core::{LoadingOverlay, NoticeMode, NotificationPort};
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use std::sync::{Arc, Mutex};

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

/// Prints notices to stderr. `msgbox` notices are framed.
///
/// Output is routed around the spinner, when one is attached, so the two do
/// not interleave.
#[derive(Default)]
pub struct TerminalNotifier {
    spinner: Option<Arc<SpinnerOverlay>>,
}

impl TerminalNotifier {
    pub fn with_spinner(spinner: Arc<SpinnerOverlay>) -> Self {
        Self {
            spinner: Some(spinner),
        }
    }

    fn render(&self, message: &str, mode: NoticeMode, is_error: bool) {
        let text = match mode {
            NoticeMode::Msg => {
                let marker = if is_error { "✗" } else { "✓" };
                format!("{} {}", marker, message)
            }
            NoticeMode::MsgBox => frame(MessageConfig::NOTICE_TITLE, message),
            NoticeMode::Hidden | NoticeMode::Null => return,
        };
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", text)),
            None => eprintln!("{}", text),
        }
    }
}

impl NotificationPort for TerminalNotifier {
    fn notify_success(&self, message: &str, mode: NoticeMode) {
        self.render(message, mode, false);
    }

    fn notify_error(&self, message: &str, mode: NoticeMode) {
        self.render(message, mode, true);
    }
}

/// Draw `message` in an ASCII box headed by `title`.
pub fn frame(title: &str, message: &str) -> String {
    let width = title.chars().count().max(message.chars().count());
    let rule = format!("+{}+", "-".repeat(width + 2));
    let row = |text: &str| {
        let pad = width - text.chars().count();
        format!("| {}{} |", text, " ".repeat(pad))
    };
    [rule.clone(), row(title), rule.clone(), row(message), rule].join("\n")
}

/// Loading overlay rendered as an indicatif spinner.
#[derive(Default)]
pub struct SpinnerOverlay {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the spinner hidden, if one is showing.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        let active = self.bar.lock().ok().and_then(|slot| slot.clone());
        match active {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

impl LoadingOverlay for SpinnerOverlay {
    fn open(&self, target: &str, attempt: u32) {
        // Cleared rather than left behind if the process exits mid-spin.
        let bar = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
        let bar = match ProgressStyle::with_template(SPINNER_TEMPLATE) {
            Ok(style) => bar.with_style(style.tick_chars(TICK)),
            Err(_) => bar,
        };
        bar.set_message(format!("{} ({})", MessageConfig::loading_text(attempt), target));
        bar.enable_steady_tick(LoadingConfig::SPINNER_TICK);

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn close(&self) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut slot| slot.take()) {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_active(overlay: &SpinnerOverlay) -> bool {
        overlay.bar.lock().unwrap().is_some()
    }

    #[test]
    fn test_frame_pads_to_widest_line() {
        let framed = frame("Notice", "Permission denied");
        let lines: Vec<&str> = framed.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "+-------------------+");
        assert_eq!(lines[1], "| Notice            |");
        assert_eq!(lines[3], "| Permission denied |");
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_spinner_close_without_open_is_noop() {
        let overlay = SpinnerOverlay::new();
        overlay.close();
        overlay.open("body", 1);
        assert!(is_active(&overlay));
        overlay.close();
        assert!(!is_active(&overlay));
    }

    #[test]
    fn test_suspend_runs_with_and_without_spinner() {
        let overlay = Arc::new(SpinnerOverlay::new());
        assert_eq!(overlay.suspend(|| 1), 1);

        overlay.open("body", 0);
        assert_eq!(overlay.suspend(|| 2), 2);
        assert!(is_active(&overlay));
        overlay.close();

        let notifier = TerminalNotifier::with_spinner(overlay.clone());
        notifier.notify_error("Operation failed", NoticeMode::Hidden);
        assert!(!is_active(&overlay));
    }
}
