//! Statistics and groupings derived from a set of entries.
//!
//! Every function takes the reference instant `now` explicitly and evaluates
//! calendar days in `now`'s time zone, so results never depend on the wall
//! clock or the machine's zone.
//!
//! Weeks start on Sunday at 00:00. The week window has no upper bound: an
//! entry stamped later than `now` still counts toward the week.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::entry::TimeEntry;

/// Calendar day of `timestamp` in `tz`.
fn calendar_day<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// First day of the week containing `now`: the Sunday on or before it.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    let since_sunday = u64::from(today.weekday().num_days_from_sunday());
    today
        .checked_sub_days(Days::new(since_sunday))
        .unwrap_or(NaiveDate::MIN)
}

/// Entries of the current week, paired with their calendar day.
fn this_week<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> Vec<(&'a TimeEntry, NaiveDate)>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let tz = now.timezone();
    let start = week_start(now);
    entries
        .into_iter()
        .map(|e| (e, calendar_day(e.timestamp(), &tz)))
        .filter(|(_, day)| *day >= start)
        .collect()
}

/// Total seconds recorded on `now`'s calendar day.
pub fn today_total<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> u64
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let tz = now.timezone();
    let today = now.date_naive();
    entries
        .into_iter()
        .filter(|e| calendar_day(e.timestamp(), &tz) == today)
        .map(TimeEntry::duration_secs)
        .sum()
}

/// Total seconds recorded since the start of the current week.
pub fn week_total<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> u64
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    this_week(entries, now)
        .into_iter()
        .map(|(e, _)| e.duration_secs())
        .sum()
}

/// Week total divided by the number of distinct days with entries this week.
///
/// Truncated to whole seconds; 0 when nothing was recorded this week.
pub fn daily_average<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> u64
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let week = this_week(entries, now);
    let days: HashSet<NaiveDate> = week.iter().map(|(_, day)| *day).collect();
    let total: u64 = week.iter().map(|(e, _)| e.duration_secs()).sum();
    match u64::try_from(days.len()) {
        Ok(0) | Err(_) => 0,
        Ok(days) => total / days,
    }
}

/// Weekly total for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    pub project: String,
    pub seconds: u64,
}

/// The project with the most time this week.
///
/// On equal totals the project whose name appears first in `entries` wins.
/// `None` when nothing was recorded this week.
pub fn top_project<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> Option<ProjectTotal>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let mut totals: Vec<ProjectTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (entry, _) in this_week(entries, now) {
        if let Some(&i) = index.get(entry.project()) {
            totals[i].seconds += entry.duration_secs();
        } else {
            index.insert(entry.project(), totals.len());
            totals.push(ProjectTotal {
                project: entry.project().to_string(),
                seconds: entry.duration_secs(),
            });
        }
    }

    // Strictly greater replaces, so the earliest name keeps a tie.
    totals.into_iter().reduce(|best, candidate| {
        if candidate.seconds > best.seconds {
            candidate
        } else {
            best
        }
    })
}

/// Which listing bucket an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBucket {
    Today,
    Yesterday,
    Older,
}

impl DayBucket {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Older => "Older",
        }
    }
}

/// Entries partitioned for display, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayGroups<'a> {
    pub today: Vec<&'a TimeEntry>,
    pub yesterday: Vec<&'a TimeEntry>,
    pub older: Vec<&'a TimeEntry>,
}

impl<'a> DayGroups<'a> {
    /// The three buckets in display order.
    pub fn buckets(&self) -> [(DayBucket, &[&'a TimeEntry]); 3] {
        [
            (DayBucket::Today, self.today.as_slice()),
            (DayBucket::Yesterday, self.yesterday.as_slice()),
            (DayBucket::Older, self.older.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.today.len() + self.yesterday.len() + self.older.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assigns an entry's calendar day to a bucket relative to `today`.
///
/// Anything that is neither today nor yesterday is `Older`, including days
/// after `today`.
pub fn bucket_for(day: NaiveDate, today: NaiveDate) -> DayBucket {
    if day == today {
        DayBucket::Today
    } else if Some(day) == today.pred_opt() {
        DayBucket::Yesterday
    } else {
        DayBucket::Older
    }
}

/// Splits entries into today, yesterday and everything else.
pub fn group_by_day<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> DayGroups<'a>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let tz = now.timezone();
    let today = now.date_naive();
    let mut groups = DayGroups::default();
    for entry in entries {
        let bucket = match bucket_for(calendar_day(entry.timestamp(), &tz), today) {
            DayBucket::Today => &mut groups.today,
            DayBucket::Yesterday => &mut groups.yesterday,
            DayBucket::Older => &mut groups.older,
        };
        bucket.push(entry);
    }
    groups
}

/// All headline statistics for one reference instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub week_start: NaiveDate,
    pub today_secs: u64,
    pub week_secs: u64,
    pub daily_average_secs: u64,
    pub top_project: Option<ProjectTotal>,
}

impl Summary {
    pub fn compute<'a, Tz, I>(entries: I, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        I: IntoIterator<Item = &'a TimeEntry> + Clone,
    {
        Self {
            week_start: week_start(now),
            today_secs: today_total(entries.clone(), now),
            week_secs: week_total(entries.clone(), now),
            daily_average_secs: daily_average(entries.clone(), now),
            top_project: top_project(entries, now),
        }
    }
}
