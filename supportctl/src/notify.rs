use owo_colors::OwoColorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Transient notices on stderr. Errors are always shown; the rest only while
/// notifications are enabled.
#[derive(Clone, Copy, Debug)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn shows(&self, level: Level) -> bool {
        self.enabled || level == Level::Error
    }

    pub fn format(level: Level, message: &str) -> String {
        match level {
            Level::Info => format!("{} {message}", "info".blue()),
            Level::Success => format!("{} {message}", "done".green()),
            Level::Error => format!("{} {message}", "error".red()),
        }
    }

    pub fn notify(&self, level: Level, message: &str) {
        if self.shows(level) {
            eprintln!("{}", Self::format(level, message));
        }
    }

    pub fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}
