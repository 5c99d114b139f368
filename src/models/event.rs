// src/models/event.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A quiz completion, with the gamification flags frozen at completion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub actor_id: i64,
    pub quiz_id: i64,
    pub completed_at: DateTime<Utc>,
    /// Percentage score 0..=100.
    pub score: u8,
    pub time_spent_secs: i64,
    pub completed_on_release_day: bool,
    pub completed_early: bool,
    pub completed_in_half_time: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeReviewEvent {
    pub actor_id: i64,
    pub quiz_id: i64,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisitEvent {
    pub actor_id: i64,
    pub quiz_id: i64,
    pub revisited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetakeEvent {
    pub actor_id: i64,
    pub quiz_id: i64,
    pub first_score: u8,
    pub second_score: u8,
    pub retaken_at: DateTime<Utc>,
}

/// One row of the append-only activity log. Entries are immutable once
/// appended; achievement state is re-derived from them on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventLogEntry {
    Completion(CompletionEvent),
    MistakeReview(MistakeReviewEvent),
    Revisit(RevisitEvent),
    Retake(RetakeEvent),
}

impl EventLogEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            EventLogEntry::Completion(_) => "completion",
            EventLogEntry::MistakeReview(_) => "mistake_review",
            EventLogEntry::Revisit(_) => "revisit",
            EventLogEntry::Retake(_) => "retake",
        }
    }

    pub fn actor_id(&self) -> i64 {
        match self {
            EventLogEntry::Completion(e) => e.actor_id,
            EventLogEntry::MistakeReview(e) => e.actor_id,
            EventLogEntry::Revisit(e) => e.actor_id,
            EventLogEntry::Retake(e) => e.actor_id,
        }
    }

    pub fn quiz_id(&self) -> i64 {
        match self {
            EventLogEntry::Completion(e) => e.quiz_id,
            EventLogEntry::MistakeReview(e) => e.quiz_id,
            EventLogEntry::Revisit(e) => e.quiz_id,
            EventLogEntry::Retake(e) => e.quiz_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EventLogEntry::Completion(e) => e.completed_at,
            EventLogEntry::MistakeReview(e) => e.reviewed_at,
            EventLogEntry::Revisit(e) => e.revisited_at,
            EventLogEntry::Retake(e) => e.retaken_at,
        }
    }
}

/// The Monday of the ISO week containing `at`. Used as the weekly grouping key
/// so that "consecutive weeks" is a plain 7-day step.
pub fn iso_week_start(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive().week(Weekday::Mon).first_day()
}

/// Per-actor snapshot of the event log, split by kind. This is the only input
/// the achievement predicates see.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    pub completions: Vec<CompletionEvent>,
    pub mistake_reviews: Vec<MistakeReviewEvent>,
    pub revisits: Vec<RevisitEvent>,
    pub retakes: Vec<RetakeEvent>,
}

impl ActivityLog {
    pub fn from_entries(entries: impl IntoIterator<Item = EventLogEntry>) -> Self {
        let mut log = ActivityLog::default();
        for entry in entries {
            match entry {
                EventLogEntry::Completion(e) => log.completions.push(e),
                EventLogEntry::MistakeReview(e) => log.mistake_reviews.push(e),
                EventLogEntry::Revisit(e) => log.revisits.push(e),
                EventLogEntry::Retake(e) => log.retakes.push(e),
            }
        }
        log
    }

    /// Derived weekly index: ISO week start -> set of quiz ids completed in
    /// that week.
    pub fn weekly_index(&self) -> BTreeMap<NaiveDate, BTreeSet<i64>> {
        let mut index: BTreeMap<NaiveDate, BTreeSet<i64>> = BTreeMap::new();
        for completion in &self.completions {
            index
                .entry(iso_week_start(completion.completed_at))
                .or_default()
                .insert(completion.quiz_id);
        }
        index
    }
}
