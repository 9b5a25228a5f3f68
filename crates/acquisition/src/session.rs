//! Session naming
//!
//! Every `start` derives the names a recorder would write to from the
//! configured prefix and the local start time. The controller only
//! computes and logs them.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};

/// Names derived for one acquisition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNaming {
    pub started_at: NaiveDateTime,
    /// `<prefix>_YYYY-MM-DD_HHhMMmSSs.rawlog`
    pub rawlog_filename: String,
    /// `<prefix>_YYYY-MM-DD_HHhMMmSSs_Images`
    pub external_storage_dir: PathBuf,
}

impl SessionNaming {
    /// Names for a session starting now (local time)
    pub fn now(prefix: &str) -> Self {
        Self::from_naive(prefix, Local::now().naive_local())
    }

    pub fn from_naive(prefix: &str, started_at: NaiveDateTime) -> Self {
        let stem = strip_invalid_file_chars(&format!(
            "{prefix}_{}",
            started_at.format("%Y-%m-%d_%Hh%Mm%Ss")
        ));

        Self {
            started_at,
            rawlog_filename: format!("{stem}.rawlog"),
            external_storage_dir: PathBuf::from(format!("{stem}_Images")),
        }
    }
}

/// Replace characters that are not safe in file names with `_`
pub fn strip_invalid_file_chars(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "()+-_=.".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}
