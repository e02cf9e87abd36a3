//! Achievement progress evaluation
//!
//! Progress is clamped into `0..=max_progress`. Unlocking is one-way: once an
//! achievement is unlocked no input makes it locked again.

use studysync_model::{
    Achievement, EARLY_BIRD, FOCUS_MASTER, NIGHT_OWL, STREAK_MASTER, TASK_CRUSHER,
};

/// Hour before which studying counts as early
pub const EARLY_BIRD_BEFORE_HOUR: u32 = 8;
/// Hour from which studying counts as late
pub const NIGHT_OWL_FROM_HOUR: u32 = 22;

/// Counters an achievement check is evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressInputs {
    /// Local hour of day, 0..24
    pub hour: u32,
    /// Lifetime completed tasks
    pub completed_tasks: u32,
    /// Current study streak in days
    pub study_streak: u32,
    /// Lifetime completed pomodoro work periods
    pub focus_sessions: u32,
}

/// Set progress, clamped, unlocking when the goal is reached
#[must_use]
pub fn apply_progress(achievement: &Achievement, progress: u32) -> Achievement {
    let mut next = achievement.clone();
    next.progress = progress.min(achievement.max_progress);
    next.unlocked = achievement.unlocked || next.progress >= achievement.max_progress;
    next
}

/// Re-evaluate one achievement; `None` when nothing changed
#[must_use]
pub fn evaluate(achievement: &Achievement, inputs: &ProgressInputs) -> Option<Achievement> {
    let next = match achievement.id.as_str() {
        EARLY_BIRD if inputs.hour < EARLY_BIRD_BEFORE_HOUR && !achievement.unlocked => {
            apply_progress(achievement, achievement.max_progress)
        }
        NIGHT_OWL if inputs.hour >= NIGHT_OWL_FROM_HOUR && !achievement.unlocked => {
            apply_progress(achievement, achievement.max_progress)
        }
        STREAK_MASTER => apply_progress(achievement, inputs.study_streak),
        TASK_CRUSHER => apply_progress(achievement, inputs.completed_tasks),
        FOCUS_MASTER => apply_progress(achievement, inputs.focus_sessions),
        _ => return None,
    };
    (next != *achievement).then_some(next)
}

/// Whether `claim` may flip the claimed flag
#[must_use]
pub fn claimable(achievement: &Achievement) -> bool {
    achievement.unlocked && !achievement.claimed
}

/// Points of claimed achievements
#[must_use]
pub fn total_points(achievements: &[Achievement]) -> u32 {
    achievements
        .iter()
        .filter(|a| a.claimed)
        .filter_map(|a| a.points)
        .sum()
}

/// Number of unlocked achievements
#[must_use]
pub fn unlocked_count(achievements: &[Achievement]) -> usize {
    achievements.iter().filter(|a| a.unlocked).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studysync_model::default_achievements;

    fn find(id: &str) -> Achievement {
        default_achievements()
            .into_iter()
            .find(|a| a.id == id)
            .unwrap()
    }

    #[test]
    fn early_bird_unlocks_only_before_eight() {
        let bird = find(EARLY_BIRD);
        let at = |hour| ProgressInputs {
            hour,
            ..ProgressInputs::default()
        };
        assert!(evaluate(&bird, &at(9)).is_none());
        let unlocked = evaluate(&bird, &at(7)).unwrap();
        assert!(unlocked.unlocked);
        assert_eq!(unlocked.progress, 1);
        assert!(evaluate(&unlocked, &at(6)).is_none());
    }

    #[test]
    fn streak_progress_can_drop_but_unlock_sticks() {
        let streak = find(STREAK_MASTER);
        let inputs = |study_streak| ProgressInputs {
            hour: 12,
            study_streak,
            ..ProgressInputs::default()
        };
        let done = evaluate(&streak, &inputs(9)).unwrap();
        assert_eq!(done.progress, 7);
        assert!(done.unlocked);

        let broken = evaluate(&done, &inputs(2)).unwrap();
        assert_eq!(broken.progress, 2);
        assert!(broken.unlocked);
    }

    #[test]
    fn points_count_claimed_only() {
        let mut all = default_achievements();
        all[0].unlocked = true;
        all[0].claimed = true;
        all[1].unlocked = true;
        assert_eq!(total_points(&all), 50);
        assert_eq!(unlocked_count(&all), 2);
        assert!(claimable(&all[1]));
        assert!(!claimable(&all[0]));
        assert!(!claimable(&all[2]));
    }
}
