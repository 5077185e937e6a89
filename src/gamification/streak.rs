//! Streak calculator

use std::collections::HashSet;

use chrono::NaiveDate;

/// Count consecutive completed days ending at `reference`.
///
/// Walks backwards one calendar day at a time and stops at the first day
/// without a completion. A missing `reference` day yields 0 even when the
/// days before it are all present.
pub fn calculate_streak<I>(dates: I, reference: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let dates: HashSet<NaiveDate> = dates.into_iter().collect();
    let mut streak = 0u32;
    let mut day = Some(reference);

    while let Some(d) = day {
        if !dates.contains(&d) {
            break;
        }
        streak += 1;
        day = d.pred_opt();
    }

    debug_assert!(streak as usize <= dates.len());
    streak
}
