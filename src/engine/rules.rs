// src/engine/rules.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;

use crate::models::achievement::{AchievementId, AchievementStatus};
use crate::models::event::ActivityLog;

/// Tunables the catalogue depends on. `weekly_quiz_target` backs WeekWarrior;
/// it is a configured constant, not a real schedule.
#[derive(Debug, Clone, Copy)]
pub struct RuleConfig {
    pub weekly_quiz_target: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            weekly_quiz_target: 3,
        }
    }
}

/// One catalogue entry: a pure predicate and a pure progress function over the
/// activity log. Neither may panic; malformed or missing data reads as
/// "condition not satisfied".
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub title: &'static str,
    pub category: &'static str,
    predicate: fn(&ActivityLog, &RuleConfig) -> bool,
    progress: fn(&ActivityLog, &RuleConfig) -> u8,
}

impl AchievementDefinition {
    pub fn evaluate(&self, log: &ActivityLog, config: &RuleConfig) -> AchievementStatus {
        AchievementStatus {
            earned: (self.predicate)(log, config),
            progress: (self.progress)(log, config),
        }
    }
}

/// min(100, round(100 * count / target)) for counted achievements.
fn ratio_progress(count: usize, target: u32) -> u8 {
    if target == 0 {
        return 100;
    }
    let pct = (100.0 * count as f64 / target as f64).round();
    if pct >= 100.0 { 100 } else { pct as u8 }
}

/// Boolean achievements report 0 until earned, then 100.
fn all_or_nothing(earned: bool) -> u8 {
    if earned { 100 } else { 0 }
}

fn any_release_day(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.completions.iter().any(|c| c.completed_on_release_day)
}

fn any_mistake_review(log: &ActivityLog, _: &RuleConfig) -> bool {
    !log.mistake_reviews.is_empty()
}

/// A revisit of a quiz 1..=7 whole days after one of its completions.
fn revisited_within_week(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.revisits.iter().any(|revisit| {
        log.completions.iter().any(|completion| {
            completion.quiz_id == revisit.quiz_id && {
                let days = (revisit.revisited_at - completion.completed_at).num_days();
                (1..=7).contains(&days)
            }
        })
    })
}

fn any_perfect_score(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.completions.iter().any(|c| c.score == 100)
}

fn early_completion_count(log: &ActivityLog) -> usize {
    log.completions.iter().filter(|c| c.completed_early).count()
}

/// Longest run of consecutive ISO weeks with at least one completion.
fn longest_weekly_streak(log: &ActivityLog) -> usize {
    let weeks: Vec<_> = log.weekly_index().into_keys().collect();
    let mut longest = 0usize;
    let mut run = 0usize;
    let mut previous = None;
    for week in weeks {
        run = match previous {
            Some(prev) if week - prev == Duration::days(7) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(week);
    }
    longest
}

fn any_half_time(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.completions.iter().any(|c| c.completed_in_half_time)
}

fn any_retake_improved_by_20(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.retakes
        .iter()
        .any(|r| i16::from(r.second_score) - i16::from(r.first_score) >= 20)
}

fn distinct_reviewed_quizzes(log: &ActivityLog) -> usize {
    log.mistake_reviews
        .iter()
        .map(|r| r.quiz_id)
        .collect::<BTreeSet<_>>()
        .len()
}

fn any_full_week(log: &ActivityLog, config: &RuleConfig) -> bool {
    log.weekly_index()
        .values()
        .any(|quizzes| quizzes.len() >= config.weekly_quiz_target as usize)
}

fn any_retake_improved(log: &ActivityLog, _: &RuleConfig) -> bool {
    log.retakes.iter().any(|r| r.second_score > r.first_score)
}

const EARLY_BIRD_TARGET: u32 = 3;
const STREAK_TARGET: u32 = 5;
const DEDICATED_TARGET: u32 = 10;
const REVIEW_CHAMPION_TARGET: u32 = 5;

/// The full engagement catalogue. Evaluation order matches declaration order;
/// ids are unique.
pub static CATALOGUE: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: AchievementId::FirstDayFinisher,
        title: "First Day Finisher",
        category: "dedication",
        predicate: any_release_day,
        progress: |log, cfg| all_or_nothing(any_release_day(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::MistakeReviewer,
        title: "Mistake Reviewer",
        category: "reflection",
        predicate: any_mistake_review,
        progress: |log, cfg| all_or_nothing(any_mistake_review(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::WeeklyRevisitor,
        title: "Weekly Revisitor",
        category: "reflection",
        predicate: revisited_within_week,
        progress: |log, cfg| all_or_nothing(revisited_within_week(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::PerfectScore,
        title: "Perfect Score",
        category: "mastery",
        predicate: any_perfect_score,
        progress: |log, cfg| all_or_nothing(any_perfect_score(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::EarlyBird,
        title: "Early Bird",
        category: "dedication",
        predicate: |log, _| early_completion_count(log) >= EARLY_BIRD_TARGET as usize,
        progress: |log, _| ratio_progress(early_completion_count(log), EARLY_BIRD_TARGET),
    },
    AchievementDefinition {
        id: AchievementId::ConsistentLearner,
        title: "Consistent Learner",
        category: "dedication",
        predicate: |log, _| longest_weekly_streak(log) >= STREAK_TARGET as usize,
        progress: |log, _| ratio_progress(longest_weekly_streak(log), STREAK_TARGET),
    },
    AchievementDefinition {
        id: AchievementId::SpeedDemon,
        title: "Speed Demon",
        category: "mastery",
        predicate: any_half_time,
        progress: |log, cfg| all_or_nothing(any_half_time(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::ImprovementMaster,
        title: "Improvement Master",
        category: "growth",
        predicate: any_retake_improved_by_20,
        progress: |log, cfg| all_or_nothing(any_retake_improved_by_20(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::DedicatedStudent,
        title: "Dedicated Student",
        category: "dedication",
        predicate: |log, _| log.completions.len() >= DEDICATED_TARGET as usize,
        progress: |log, _| ratio_progress(log.completions.len(), DEDICATED_TARGET),
    },
    AchievementDefinition {
        id: AchievementId::ReviewChampion,
        title: "Review Champion",
        category: "reflection",
        predicate: |log, _| distinct_reviewed_quizzes(log) >= REVIEW_CHAMPION_TARGET as usize,
        progress: |log, _| ratio_progress(distinct_reviewed_quizzes(log), REVIEW_CHAMPION_TARGET),
    },
    AchievementDefinition {
        id: AchievementId::WeekWarrior,
        title: "Week Warrior",
        category: "dedication",
        predicate: any_full_week,
        progress: |log, cfg| all_or_nothing(any_full_week(log, cfg)),
    },
    AchievementDefinition {
        id: AchievementId::ComebackKing,
        title: "Comeback King",
        category: "growth",
        predicate: any_retake_improved,
        progress: |log, cfg| all_or_nothing(any_retake_improved(log, cfg)),
    },
];

/// Re-derives the full achievement state from the log. Pure and idempotent:
/// no incremental state is kept anywhere.
pub fn evaluate_all(
    log: &ActivityLog,
    config: &RuleConfig,
) -> BTreeMap<AchievementId, AchievementStatus> {
    CATALOGUE
        .iter()
        .map(|def| (def.id, def.evaluate(log, config)))
        .collect()
}

/// Ids whose `earned` flag flipped false -> true between two evaluations.
/// The caller fires the "newly earned" notification on exactly this edge.
pub fn newly_earned(
    previous: &BTreeMap<AchievementId, AchievementStatus>,
    next: &BTreeMap<AchievementId, AchievementStatus>,
) -> Vec<AchievementId> {
    next.iter()
        .filter(|(id, status)| {
            status.earned && !previous.get(*id).map(|s| s.earned).unwrap_or(false)
        })
        .map(|(id, _)| *id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{
        CompletionEvent, MistakeReviewEvent, RetakeEvent, RevisitEvent,
    };
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn completion(quiz_id: i64, completed_at: &str) -> CompletionEvent {
        CompletionEvent {
            actor_id: 1,
            quiz_id,
            completed_at: at(completed_at),
            score: 70,
            time_spent_secs: 300,
            completed_on_release_day: false,
            completed_early: false,
            completed_in_half_time: false,
        }
    }

    fn review(quiz_id: i64) -> MistakeReviewEvent {
        MistakeReviewEvent {
            actor_id: 1,
            quiz_id,
            reviewed_at: at("2024-03-01T10:00:00Z"),
        }
    }

    fn status(log: &ActivityLog, id: AchievementId) -> AchievementStatus {
        evaluate_all(log, &RuleConfig::default())[&id]
    }

    #[test]
    fn catalogue_has_twelve_unique_ids() {
        let ids: BTreeSet<_> = CATALOGUE.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(CATALOGUE.len(), 12);
    }

    #[test]
    fn first_day_finisher_needs_release_day_completion() {
        let mut log = ActivityLog::default();
        log.completions.push(completion(1, "2024-01-02T10:00:00Z"));
        assert!(!status(&log, AchievementId::FirstDayFinisher).earned);

        log.completions[0].completed_on_release_day = true;
        let s = status(&log, AchievementId::FirstDayFinisher);
        assert!(s.earned);
        assert_eq!(s.progress, 100);
    }

    #[test]
    fn weekly_revisitor_respects_the_window() {
        let mut log = ActivityLog::default();
        log.completions.push(completion(1, "2024-01-01T00:00:00Z"));

        // 8 days later: outside the window.
        log.revisits.push(RevisitEvent {
            actor_id: 1,
            quiz_id: 1,
            revisited_at: at("2024-01-09T00:00:00Z"),
        });
        assert!(!status(&log, AchievementId::WeeklyRevisitor).earned);

        // 5 days later: inside.
        log.revisits.push(RevisitEvent {
            actor_id: 1,
            quiz_id: 1,
            revisited_at: at("2024-01-06T00:00:00Z"),
        });
        assert!(status(&log, AchievementId::WeeklyRevisitor).earned);
    }

    #[test]
    fn weekly_revisitor_ignores_other_quizzes_and_same_day() {
        let mut log = ActivityLog::default();
        log.completions.push(completion(1, "2024-01-01T00:00:00Z"));
        // Different quiz, in-window.
        log.revisits.push(RevisitEvent {
            actor_id: 1,
            quiz_id: 2,
            revisited_at: at("2024-01-03T00:00:00Z"),
        });
        // Same quiz, same day (0 days).
        log.revisits.push(RevisitEvent {
            actor_id: 1,
            quiz_id: 1,
            revisited_at: at("2024-01-01T12:00:00Z"),
        });
        assert!(!status(&log, AchievementId::WeeklyRevisitor).earned);
    }

    #[test]
    fn early_bird_counts_toward_three() {
        let mut log = ActivityLog::default();
        for i in 0..2 {
            let mut c = completion(i, "2024-01-01T10:00:00Z");
            c.completed_early = true;
            log.completions.push(c);
        }
        let s = status(&log, AchievementId::EarlyBird);
        assert!(!s.earned);
        assert_eq!(s.progress, 67);

        let mut c = completion(9, "2024-01-02T10:00:00Z");
        c.completed_early = true;
        log.completions.push(c);
        let s = status(&log, AchievementId::EarlyBird);
        assert!(s.earned);
        assert_eq!(s.progress, 100);
    }

    #[test]
    fn consistent_learner_streak_of_four_gives_eighty() {
        // Weeks 1,2 then a gap at week 3, then weeks 4..=7: longest run is 4.
        let mut log = ActivityLog::default();
        for monday in ["2024-01-01", "2024-01-08", "2024-01-22", "2024-01-29", "2024-02-05", "2024-02-12"] {
            log.completions
                .push(completion(1, &format!("{monday}T09:00:00Z")));
        }
        assert_eq!(longest_weekly_streak(&log), 4);
        let s = status(&log, AchievementId::ConsistentLearner);
        assert!(!s.earned);
        assert_eq!(s.progress, 80);
    }

    #[test]
    fn consistent_learner_earns_at_five_weeks() {
        let mut log = ActivityLog::default();
        for monday in ["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22", "2024-01-29"] {
            log.completions
                .push(completion(1, &format!("{monday}T09:00:00Z")));
        }
        let s = status(&log, AchievementId::ConsistentLearner);
        assert!(s.earned);
        assert_eq!(s.progress, 100);
    }

    #[test]
    fn improvement_master_needs_twenty_points() {
        let mut log = ActivityLog::default();
        log.retakes.push(RetakeEvent {
            actor_id: 1,
            quiz_id: 1,
            first_score: 60,
            second_score: 79,
            retaken_at: at("2024-01-05T10:00:00Z"),
        });
        assert!(!status(&log, AchievementId::ImprovementMaster).earned);
        // 19 points is still a comeback, though.
        assert!(status(&log, AchievementId::ComebackKing).earned);

        log.retakes.push(RetakeEvent {
            actor_id: 1,
            quiz_id: 1,
            first_score: 60,
            second_score: 80,
            retaken_at: at("2024-01-06T10:00:00Z"),
        });
        assert!(status(&log, AchievementId::ImprovementMaster).earned);
    }

    #[test]
    fn comeback_king_ignores_regressions() {
        let mut log = ActivityLog::default();
        log.retakes.push(RetakeEvent {
            actor_id: 1,
            quiz_id: 1,
            first_score: 90,
            second_score: 70,
            retaken_at: at("2024-01-05T10:00:00Z"),
        });
        assert!(!status(&log, AchievementId::ComebackKing).earned);
    }

    #[test]
    fn dedicated_student_progresses_toward_ten() {
        let mut log = ActivityLog::default();
        for i in 0..7 {
            log.completions.push(completion(i, "2024-01-01T10:00:00Z"));
        }
        let s = status(&log, AchievementId::DedicatedStudent);
        assert!(!s.earned);
        assert_eq!(s.progress, 70);

        for i in 7..10 {
            log.completions.push(completion(i, "2024-01-01T10:00:00Z"));
        }
        assert!(status(&log, AchievementId::DedicatedStudent).earned);
    }

    #[test]
    fn review_champion_counts_distinct_quizzes() {
        let mut log = ActivityLog::default();
        // Six reviews but only three distinct quizzes.
        for quiz in [1, 1, 2, 2, 3, 3] {
            log.mistake_reviews.push(review(quiz));
        }
        let s = status(&log, AchievementId::ReviewChampion);
        assert!(!s.earned);
        assert_eq!(s.progress, 60);
        assert!(status(&log, AchievementId::MistakeReviewer).earned);

        log.mistake_reviews.push(review(4));
        log.mistake_reviews.push(review(5));
        assert!(status(&log, AchievementId::ReviewChampion).earned);
    }

    #[test]
    fn week_warrior_uses_configured_target() {
        let mut log = ActivityLog::default();
        for quiz in [1, 2, 3] {
            log.completions.push(completion(quiz, "2024-01-02T10:00:00Z"));
        }
        assert!(status(&log, AchievementId::WeekWarrior).earned);

        let strict = RuleConfig {
            weekly_quiz_target: 4,
        };
        assert!(!evaluate_all(&log, &strict)[&AchievementId::WeekWarrior].earned);
    }

    #[test]
    fn perfect_and_speed_rules_read_completion_flags() {
        let mut log = ActivityLog::default();
        let mut c = completion(1, "2024-01-01T10:00:00Z");
        c.score = 100;
        c.completed_in_half_time = true;
        log.completions.push(c);
        assert!(status(&log, AchievementId::PerfectScore).earned);
        assert!(status(&log, AchievementId::SpeedDemon).earned);
    }

    #[test]
    fn empty_log_earns_nothing() {
        let log = ActivityLog::default();
        let all = evaluate_all(&log, &RuleConfig::default());
        assert_eq!(all.len(), 12);
        assert!(all.values().all(|s| !s.earned && s.progress == 0));
    }

    #[test]
    fn newly_earned_fires_only_on_the_edge() {
        let mut log = ActivityLog::default();
        let before = evaluate_all(&log, &RuleConfig::default());

        log.mistake_reviews.push(review(1));
        let after = evaluate_all(&log, &RuleConfig::default());
        assert_eq!(
            newly_earned(&before, &after),
            vec![AchievementId::MistakeReviewer]
        );

        // Already earned: no second notification.
        log.mistake_reviews.push(review(2));
        let later = evaluate_all(&log, &RuleConfig::default());
        assert!(newly_earned(&after, &later).is_empty());
    }
}
