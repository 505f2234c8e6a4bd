// src/codec.rs
//! Line-oriented text encoding of a workout:
//!
//! ```text
//! #<category>
//! -<workout name>
//! -<sets> sets <reps> reps
//! -<weight> kg
//! -<duration> min
//! ```
use crate::models::{Category, ValidationError, WorkoutFields};
use thiserror::Error;

pub const CATEGORY_MARKER: char = '#';
pub const ITEM_MARKER: char = '-';
pub const MIN_LINES: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Workout text needs at least 5 non-blank lines, found {0}.")]
    TooFewLines(usize),
    #[error("First line must start with '#' followed by the category.")]
    MissingCategoryMarker,
    #[error("Second line must start with '-' followed by the workout name.")]
    MissingNameMarker,
    #[error("Category cannot be empty.")]
    EmptyCategory,
    #[error("Workout name cannot be empty.")]
    EmptyName,
    #[error("Unknown category '{0}'.")]
    UnknownCategory(String),
    #[error("Could not read {field} from line '{line}'.")]
    BadDetailLine { field: &'static str, line: String },
    #[error(transparent)]
    OutOfRange(#[from] ValidationError),
}

/// Category and name recovered from workout text. The three detail lines are
/// kept as written (marker stripped) and are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRecord {
    pub category: String,
    pub workout_name: String,
    pub details: Vec<String>,
}

impl PartialRecord {
    pub fn category_kind(&self) -> Option<Category> {
        Category::from_label(&self.category)
    }
}

pub fn encode(fields: &WorkoutFields) -> String {
    format!(
        "{CATEGORY_MARKER}{}\n{ITEM_MARKER}{}\n{ITEM_MARKER}{} sets {} reps\n{ITEM_MARKER}{} kg\n{ITEM_MARKER}{} min",
        fields.category,
        fields.workout_name,
        fields.sets,
        fields.reps,
        fields.weight,
        fields.duration
    )
}

fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Decodes the category and name lines and checks the overall shape.
/// # Errors
/// Returns a `FormatError` when fewer than five non-blank lines are present or
/// the first two lines are missing their markers or content.
pub fn decode(text: &str) -> Result<PartialRecord, FormatError> {
    let lines = content_lines(text);
    if lines.len() < MIN_LINES {
        return Err(FormatError::TooFewLines(lines.len()));
    }

    let category = lines[0]
        .strip_prefix(CATEGORY_MARKER)
        .ok_or(FormatError::MissingCategoryMarker)?
        .trim();
    if category.is_empty() {
        return Err(FormatError::EmptyCategory);
    }

    let workout_name = lines[1]
        .strip_prefix(ITEM_MARKER)
        .ok_or(FormatError::MissingNameMarker)?
        .trim();
    if workout_name.is_empty() {
        return Err(FormatError::EmptyName);
    }

    let details = lines[2..]
        .iter()
        .map(|&line| line.strip_prefix(ITEM_MARKER).unwrap_or(line).trim().to_string())
        .collect();

    Ok(PartialRecord {
        category: category.to_string(),
        workout_name: workout_name.to_string(),
        details,
    })
}

fn number_before<T: std::str::FromStr>(
    detail: &str,
    unit: &str,
    field: &'static str,
) -> Result<T, FormatError> {
    let bad = || FormatError::BadDetailLine {
        field,
        line: detail.to_string(),
    };
    let words: Vec<&str> = detail.split_whitespace().collect();
    let pos = words
        .iter()
        .position(|w| w.eq_ignore_ascii_case(unit))
        .ok_or_else(bad)?;
    if pos == 0 {
        return Err(bad());
    }
    words[pos - 1].parse::<T>().map_err(|_| bad())
}

/// Like [`decode`], but also requires a known category and numeric detail
/// lines, returning fully structured fields.
/// # Errors
/// Any `FormatError` from [`decode`], plus `UnknownCategory`, `BadDetailLine`
/// and `OutOfRange`.
pub fn decode_strict(text: &str) -> Result<WorkoutFields, FormatError> {
    let partial = decode(text)?;
    let category = partial
        .category_kind()
        .ok_or_else(|| FormatError::UnknownCategory(partial.category.clone()))?;

    let fields = WorkoutFields {
        category,
        workout_name: partial.workout_name,
        sets: number_before(&partial.details[0], "sets", "sets")?,
        reps: number_before(&partial.details[0], "reps", "reps")?,
        weight: number_before(&partial.details[1], "kg", "weight")?,
        duration: number_before(&partial.details[2], "min", "duration")?,
    };
    fields.validate()?;
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> WorkoutFields {
        WorkoutFields {
            category: Category::FullBody,
            workout_name: "Burpees".to_string(),
            sets: 4,
            reps: 12,
            weight: 0.0,
            duration: 15.5,
        }
    }

    #[test]
    fn encode_matches_wire_layout() {
        assert_eq!(
            encode(&run()),
            "#Full Body\n-Burpees\n-4 sets 12 reps\n-0 kg\n-15.5 min"
        );
    }

    #[test]
    fn decode_recovers_category_and_name() {
        let decoded = decode(&encode(&run())).unwrap();
        assert_eq!(decoded.category, "Full Body");
        assert_eq!(decoded.workout_name, "Burpees");
        assert_eq!(decoded.category_kind(), Some(Category::FullBody));
        assert_eq!(decoded.details, vec!["4 sets 12 reps", "0 kg", "15.5 min"]);
    }

    #[test]
    fn decode_skips_blank_lines_and_trims() {
        let text = "\n  # Legs \n\n-  Back Squat\n-5 setsX15 reps\n   \n-30 kg\n-10 min\n";
        let decoded = decode(text).unwrap();
        assert_eq!(decoded.category, "Legs");
        assert_eq!(decoded.workout_name, "Back Squat");
    }

    #[test]
    fn decode_rejects_short_or_unmarked_text() {
        assert_eq!(
            decode("#Legs\n-Squat\n-3 sets 10 reps\n\n-50 kg"),
            Err(FormatError::TooFewLines(4))
        );
        assert_eq!(decode(""), Err(FormatError::TooFewLines(0)));
        assert_eq!(
            decode("Legs\n-Squat\n-3 sets 10 reps\n-50 kg\n-20 min"),
            Err(FormatError::MissingCategoryMarker)
        );
        assert_eq!(
            decode("#Legs\nSquat\n-3 sets 10 reps\n-50 kg\n-20 min"),
            Err(FormatError::MissingNameMarker)
        );
        assert_eq!(
            decode("#\n-Squat\n-3 sets 10 reps\n-50 kg\n-20 min"),
            Err(FormatError::EmptyCategory)
        );
    }

    #[test]
    fn loose_decode_accepts_garbage_detail_lines() {
        let text = "#Legs\n-Squat\n-lots\n-heavy\n-long";
        assert!(decode(text).is_ok());
        assert!(matches!(
            decode_strict(text),
            Err(FormatError::BadDetailLine { field: "sets", .. })
        ));
    }

    #[test]
    fn strict_decode_returns_structured_fields() {
        assert_eq!(decode_strict(&encode(&run())).unwrap(), run());
        assert_eq!(
            decode_strict("#Stretching\n-Yoga\n-1 sets 1 reps\n-0 kg\n-30 min"),
            Err(FormatError::UnknownCategory("Stretching".to_string()))
        );
        assert!(matches!(
            decode_strict("#Legs\n-Squat\n-0 sets 10 reps\n-50 kg\n-20 min"),
            Err(FormatError::OutOfRange(_))
        ));
    }
}
