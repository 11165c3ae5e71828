use crate::error::{AdvisoryError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const QUESTION_COUNT: usize = 8;
pub const MIN_ANSWER: i32 = 1;
pub const MAX_ANSWER: i32 = 4;

// Inclusive upper bounds of the lower tiers.
const CONSERVATIVE_MAX_TOTAL: i32 = 14;
const MODERATE_MAX_TOTAL: i32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [Self::Conservative, Self::Moderate, Self::Aggressive];

    /// Display label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Konservatif",
            Self::Moderate => "Moderat",
            Self::Aggressive => "Agresif",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated risk questionnaire: exactly eight answers on the 1..=4 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Questionnaire {
    answers: [i32; QUESTION_COUNT],
}

impl Questionnaire {
    /// Missing or out-of-scale answers are rejected rather than defaulted.
    pub fn try_new(answers: &[i32]) -> CoreResult<Self> {
        if answers.len() != QUESTION_COUNT {
            return Err(AdvisoryError::invalid(
                "answers",
                format!(
                    "questionnaire must contain exactly {QUESTION_COUNT} answers (got {})",
                    answers.len()
                ),
            ));
        }

        let mut out = [0; QUESTION_COUNT];
        for (i, &a) in answers.iter().enumerate() {
            if !(MIN_ANSWER..=MAX_ANSWER).contains(&a) {
                return Err(AdvisoryError::invalid(
                    "answers",
                    format!(
                        "answer q{} must be {MIN_ANSWER}..={MAX_ANSWER} (got {a})",
                        i + 1
                    ),
                ));
            }
            out[i] = a;
        }

        Ok(Self { answers: out })
    }

    pub fn total(&self) -> i32 {
        self.answers.iter().sum()
    }
}

/// Threshold mapping from a questionnaire total to a tier.
pub fn classify_total(total: i32) -> RiskTier {
    if total <= CONSERVATIVE_MAX_TOTAL {
        RiskTier::Conservative
    } else if total <= MODERATE_MAX_TOTAL {
        RiskTier::Moderate
    } else {
        RiskTier::Aggressive
    }
}

pub fn classify(questionnaire: &Questionnaire) -> RiskTier {
    classify_total(questionnaire.total())
}

/// Validates raw answers and classifies them in one step.
pub fn classify_answers(answers: &[i32]) -> CoreResult<RiskTier> {
    Ok(classify(&Questionnaire::try_new(answers)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive_on_the_lower_tier() {
        assert_eq!(classify_total(14), RiskTier::Conservative);
        assert_eq!(classify_total(15), RiskTier::Moderate);
        assert_eq!(classify_total(21), RiskTier::Moderate);
        assert_eq!(classify_total(22), RiskTier::Aggressive);
    }

    #[test]
    fn every_reachable_total_maps_to_exactly_one_tier() {
        for total in 0..=40 {
            let expected = if total <= 14 {
                RiskTier::Conservative
            } else if total <= 21 {
                RiskTier::Moderate
            } else {
                RiskTier::Aggressive
            };
            assert_eq!(classify_total(total), expected, "total={total}");
        }
    }

    #[test]
    fn classifies_validated_answers() {
        // 2+2+2+2+2+2+1+1 = 14
        assert_eq!(
            classify_answers(&[2, 2, 2, 2, 2, 2, 1, 1]).unwrap(),
            RiskTier::Conservative
        );
        // 2+2+2+2+2+2+2+1 = 15
        assert_eq!(
            classify_answers(&[2, 2, 2, 2, 2, 2, 2, 1]).unwrap(),
            RiskTier::Moderate
        );
        // 3*5 + 2*3 = 21
        assert_eq!(
            classify_answers(&[3, 3, 3, 3, 3, 2, 2, 2]).unwrap(),
            RiskTier::Moderate
        );
        // 3*6 + 2*2 = 22
        assert_eq!(
            classify_answers(&[3, 3, 3, 3, 3, 3, 2, 2]).unwrap(),
            RiskTier::Aggressive
        );
        assert_eq!(classify_answers(&[4; 8]).unwrap(), RiskTier::Aggressive);
        assert_eq!(classify_answers(&[1; 8]).unwrap(), RiskTier::Conservative);
    }

    #[test]
    fn rejects_missing_answers() {
        let err = classify_answers(&[3, 3, 3]).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("exactly 8 answers"));
    }

    #[test]
    fn rejects_out_of_scale_answers() {
        let err = Questionnaire::try_new(&[1, 2, 3, 4, 5, 1, 1, 1]).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("q5"));

        assert!(Questionnaire::try_new(&[0, 1, 1, 1, 1, 1, 1, 1]).is_err());
    }

    #[test]
    fn labels_match_display() {
        assert_eq!(RiskTier::Moderate.to_string(), "Moderat");
        assert_eq!(
            serde_json::to_value(RiskTier::Aggressive).unwrap(),
            serde_json::json!("aggressive")
        );
    }
}
