use std::fmt;

use serde::Serialize;

use crate::models::GradedResult;

pub const MAX_MARKS: u32 = 10;
const PASS_SIMILARITY: f64 = 80.0;
const BORDERLINE_SIMILARITY: f64 = 50.0;
const PASS_MARKS: u32 = 7;

/// Colour bucket for a similarity score on the review screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Pass,
    Borderline,
    Fail,
}

impl ScoreTier {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Pass => "pass",
            ScoreTier::Borderline => "borderline",
            ScoreTier::Fail => "fail",
        }
    }
}

/// NaN falls through to `Fail`.
pub fn tier(similarity: f64) -> ScoreTier {
    if similarity >= PASS_SIMILARITY {
        ScoreTier::Pass
    } else if similarity >= BORDERLINE_SIMILARITY {
        ScoreTier::Borderline
    } else {
        ScoreTier::Fail
    }
}

pub fn is_passing_marks(marks: u32) -> bool {
    marks >= PASS_MARKS
}

pub fn format_similarity(similarity: f64) -> String {
    format!("{:.2}%", similarity)
}

pub fn format_marks(marks: u32) -> String {
    format!("{}/{}", marks, MAX_MARKS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScoreTotal {
    pub earned: u64,
    pub possible: u64,
}

impl ScoreTotal {
    pub fn of(results: &[GradedResult]) -> Self {
        Self {
            earned: results.iter().map(|r| u64::from(r.marks)).sum(),
            possible: results.len() as u64 * u64::from(MAX_MARKS),
        }
    }
}

impl fmt::Display for ScoreTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.earned, self.possible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(marks: u32) -> GradedResult {
        GradedResult {
            id: 1,
            question: "Q".into(),
            answer: "A".into(),
            user_answer: "U".into(),
            similarity: 0.0,
            marks,
        }
    }

    mod tier_tests {
        use super::*;

        #[test]
        fn boundaries_are_inclusive() {
            assert_eq!(tier(80.0), ScoreTier::Pass);
            assert_eq!(tier(79.99), ScoreTier::Borderline);
            assert_eq!(tier(50.0), ScoreTier::Borderline);
            assert_eq!(tier(49.99), ScoreTier::Fail);
        }

        #[test]
        fn extremes() {
            assert_eq!(tier(100.0), ScoreTier::Pass);
            assert_eq!(tier(0.0), ScoreTier::Fail);
        }

        #[test]
        fn nan_is_fail() {
            assert_eq!(tier(f64::NAN), ScoreTier::Fail);
        }

        #[test]
        fn labels() {
            assert_eq!(ScoreTier::Pass.label(), "pass");
            assert_eq!(ScoreTier::Borderline.label(), "borderline");
            assert_eq!(ScoreTier::Fail.label(), "fail");
        }
    }

    mod total_tests {
        use super::*;

        #[test]
        fn sums_marks_over_ten_per_question() {
            let total = ScoreTotal::of(&[graded(7), graded(3), graded(10)]);
            assert_eq!(total.earned, 20);
            assert_eq!(total.possible, 30);
            assert_eq!(total.to_string(), "20 / 30");
        }

        #[test]
        fn empty_input_is_zero_over_zero() {
            let total = ScoreTotal::of(&[]);
            assert_eq!(total, ScoreTotal::default());
            assert_eq!(total.to_string(), "0 / 0");
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn similarity_has_two_decimals() {
            assert_eq!(format_similarity(87.5), "87.50%");
            assert_eq!(format_similarity(33.3333), "33.33%");
            assert_eq!(format_similarity(0.0), "0.00%");
            assert_eq!(format_similarity(100.0), "100.00%");
        }

        #[test]
        fn marks_are_out_of_ten() {
            assert_eq!(format_marks(7), "7/10");
            assert_eq!(format_marks(0), "0/10");
        }

        #[test]
        fn passing_marks_threshold() {
            assert!(is_passing_marks(7));
            assert!(!is_passing_marks(6));
        }
    }
}
