use crate::error::BloomError;
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Length of the activity window in days, not counting today.
pub const WINDOW_DAYS: i64 = 30;

/// Summary of a user's recent contribution history.
///
/// All-zero is a valid, drawable state: it is what the host holds before the
/// first fetch completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityMetrics {
    pub total_commits: u32,
    pub merged_prs: u32,
    pub streak: u32,
    pub max_streak: u32,
    /// Distinct days with at least one commit, 0..=30.
    pub days_with_commits: u32,
}

impl ActivityMetrics {
    /// Commits plus merged pull requests, saturating.
    pub fn activity_score(&self) -> u32 {
        self.total_commits.saturating_add(self.merged_prs)
    }

    /// Derive the calendar part of the metrics from a set of commit days.
    ///
    /// Walks the window oldest to newest, ending on `today`. A day with a
    /// commit extends the running streak; a day without one resets it. The
    /// streak reported is the one still running on `today`.
    pub fn from_commit_days(days: &[NaiveDate], today: NaiveDate) -> Self {
        let committed: HashSet<NaiveDate> = days.iter().copied().collect();

        let mut streak = 0u32;
        let mut max_streak = 0u32;
        let mut days_in_window = 0u32;

        for offset in (0..=WINDOW_DAYS).rev() {
            let day = today - Duration::days(offset);
            if committed.contains(&day) {
                streak += 1;
                days_in_window += 1;
                max_streak = max_streak.max(streak);
            } else {
                streak = 0;
            }
        }

        ActivityMetrics {
            streak,
            max_streak,
            days_with_commits: days_in_window.min(WINDOW_DAYS as u32),
            ..ActivityMetrics::default()
        }
    }
}

/// `days_with_commits` arrives either as the raw day list the backend
/// returns or as an already-reduced count.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommitDays {
    List(Vec<String>),
    Count(u32),
}

impl Default for CommitDays {
    fn default() -> Self {
        CommitDays::Count(0)
    }
}

/// Body of the backend's `/commit_activity` response.
#[derive(Debug, Deserialize)]
pub struct CommitActivity {
    #[serde(default)]
    total_commits: u32,
    #[serde(default)]
    merged_prs: u32,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    max_streak: u32,
    #[serde(default)]
    days_with_commits: CommitDays,
}

impl CommitActivity {
    /// Commit days parsed from the response. Empty when only a count was sent.
    pub fn commit_days(&self) -> Vec<NaiveDate> {
        match &self.days_with_commits {
            CommitDays::List(days) => days.iter().filter_map(|d| parse_commit_day(d)).collect(),
            CommitDays::Count(_) => Vec::new(),
        }
    }

    /// Metrics with the streak fields recomputed from the commit days,
    /// keeping the reported commit and pull request totals.
    pub fn metrics_as_of(&self, today: NaiveDate) -> ActivityMetrics {
        ActivityMetrics {
            total_commits: self.total_commits,
            merged_prs: self.merged_prs,
            ..ActivityMetrics::from_commit_days(&self.commit_days(), today)
        }
    }
}

impl From<CommitActivity> for ActivityMetrics {
    fn from(raw: CommitActivity) -> Self {
        let days = match raw.days_with_commits {
            CommitDays::List(days) => {
                let distinct: HashSet<&str> = days.iter().map(String::as_str).collect();
                distinct.len() as u32
            }
            CommitDays::Count(n) => n,
        };
        ActivityMetrics {
            total_commits: raw.total_commits,
            merged_prs: raw.merged_prs,
            streak: raw.streak,
            max_streak: raw.max_streak,
            days_with_commits: days.min(WINDOW_DAYS as u32),
        }
    }
}

/// Parse the leading `YYYY-MM-DD` of a commit timestamp.
pub fn parse_commit_day(stamp: &str) -> Option<NaiveDate> {
    let day = stamp.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn parse_activity(contents: &str) -> Result<CommitActivity, BloomError> {
    Ok(serde_json::from_str(contents)?)
}

pub fn parse_metrics(contents: &str) -> Result<ActivityMetrics, BloomError> {
    Ok(parse_activity(contents)?.into())
}

pub fn load_activity(path: &Path) -> Result<CommitActivity, BloomError> {
    let contents = fs::read_to_string(path)?;
    parse_activity(&contents)
}
