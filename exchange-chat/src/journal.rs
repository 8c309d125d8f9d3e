use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Append-only text log of executed exchange commands.
#[derive(Debug, Clone)]
pub struct ExchangeJournal {
    path: PathBuf,
}

impl ExchangeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[DD.MM.YYYY HH:MM:SS] -> message` stamped with the local time.
    pub async fn append(&self, message: &str) -> io::Result<()> {
        let entry = format_entry(Local::now().naive_local(), message);

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

pub fn format_entry(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] -> {message}\n", at.format(TIMESTAMP_FORMAT))
}
