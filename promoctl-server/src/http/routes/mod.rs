//! Route handlers organized by resource

pub mod health;
pub mod promoter_groups;
pub mod promoters;
pub mod skills;

use chrono::{NaiveDate, Utc};

/// The day birthdays must precede.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
