// src/duplicate.rs
use crate::codec;
use crate::models::WorkoutRecord;
use tracing::debug;

/// Best-effort check of candidate workout text against the records already
/// cached for the day. Matching is exact on trimmed category and name.
///
/// Never fails: undecodable text or an empty day simply is not a duplicate,
/// the server's uniqueness constraint has the final word.
pub fn is_duplicate(candidate_text: &str, day_snapshot: &[WorkoutRecord]) -> bool {
    if day_snapshot.is_empty() {
        return false;
    }
    let candidate = match codec::decode(candidate_text) {
        Ok(partial) => partial,
        Err(e) => {
            debug!("Duplicate check skipped, candidate does not decode: {e}");
            return false;
        }
    };

    day_snapshot.iter().any(|existing| {
        existing.category().to_string().trim() == candidate.category
            && existing.workout_name().trim() == candidate.workout_name
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, WorkoutFields, WorkoutId};
    use chrono::NaiveDate;

    fn record(category: Category, name: &str) -> WorkoutRecord {
        WorkoutRecord {
            id: WorkoutId::new("w0"),
            fields: WorkoutFields {
                category,
                workout_name: name.to_string(),
                sets: 3,
                reps: 10,
                weight: 50.0,
                duration: 20.0,
            },
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            calories_burned: None,
        }
    }

    #[test]
    fn matches_same_category_and_name() {
        let day = vec![record(Category::Legs, "Squat")];
        assert!(is_duplicate(
            "#Legs\n-Squat\n-3 sets 10 reps\n-50 kg\n-20 min",
            &day
        ));
        assert!(!is_duplicate(
            "#Legs\n-Lunge\n-3 sets 10 reps\n-50 kg\n-20 min",
            &day
        ));
    }

    #[test]
    fn same_name_in_other_category_is_not_a_duplicate() {
        let day = vec![record(Category::Legs, "Squat")];
        assert!(!is_duplicate(
            "#Full Body\n-Squat\n-3 sets 10 reps\n-50 kg\n-20 min",
            &day
        ));
    }

    #[test]
    fn comparison_is_trimmed_but_case_sensitive() {
        let day = vec![record(Category::Legs, " Squat ")];
        assert!(is_duplicate("#  Legs\n-Squat  \n-1\n-2\n-3", &day));
        assert!(!is_duplicate("#Legs\n-squat\n-1\n-2\n-3", &day));
    }

    #[test]
    fn empty_day_or_bad_text_is_never_a_duplicate() {
        assert!(!is_duplicate("#Legs\n-Squat\n-1\n-2\n-3", &[]));
        let day = vec![record(Category::Legs, "Squat")];
        assert!(!is_duplicate("#Legs\n-Squat", &day));
        assert!(!is_duplicate("Legs\n-Squat\n-1\n-2\n-3", &day));
    }
}
