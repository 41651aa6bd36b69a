use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const COMMAND_LOG_FILE: &str = "commands.log";

/// Append-only JSON-lines log of planner commands. Write failures are
/// swallowed; logging never fails a command.
#[derive(Debug)]
pub struct CommandLog {
    logs_dir: Option<PathBuf>,
    guard: Mutex<()>,
}

impl CommandLog {
    pub fn new(logs_dir: impl AsRef<Path>) -> Self {
        Self {
            logs_dir: Some(logs_dir.as_ref().to_path_buf()),
            guard: Mutex::new(()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            logs_dir: None,
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.logs_dir.as_ref().map(|dir| dir.join(COMMAND_LOG_FILE))
    }

    pub fn info(&self, command: &str, message: &str) {
        self.append("info", command, message);
    }

    pub fn warn(&self, command: &str, message: &str) {
        self.append("warn", command, message);
    }

    pub fn error(&self, command: &str, message: &str) {
        self.append("error", command, message);
    }

    fn append(&self, level: &str, command: &str, message: &str) {
        let Some(path) = self.path() else {
            return;
        };
        let Ok(_guard) = self.guard.lock() else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::disabled()
    }
}
