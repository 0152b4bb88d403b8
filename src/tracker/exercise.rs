use std::fmt;

use serde::{Deserialize, Serialize};

/// Exercises the counter knows how to label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Squats,
    Pushups,
}

impl ExerciseKind {
    /// Declaration order, used to break ranking ties
    pub const ALL: [ExerciseKind; 2] = [Self::Squats, Self::Pushups];

    /// Lowercase token, also the prefix of the default pose labels
    pub fn token(&self) -> &'static str {
        match self {
            Self::Squats => "squats",
            Self::Pushups => "pushups",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Squats => "Squats",
            Self::Pushups => "Pushups",
        }
    }

    /// (down-label, up-label) in the bundled sample set
    pub fn default_labels(&self) -> (&'static str, &'static str) {
        match self {
            Self::Squats => ("squats_down", "squats_up"),
            Self::Pushups => ("pushups_down", "pushups_up"),
        }
    }

    /// Kind whose token appears in `text`, first declared wins
    pub fn from_token(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| text.contains(k.token()))
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One tracked exercise and the pose labels its counter watches
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExerciseConfig {
    pub kind: ExerciseKind,
    pub down_label: String,
    pub up_label: String,
}

impl ExerciseConfig {
    pub fn new(kind: ExerciseKind, down_label: impl Into<String>, up_label: impl Into<String>) -> Self {
        Self {
            kind,
            down_label: down_label.into(),
            up_label: up_label.into(),
        }
    }

    pub fn with_default_labels(kind: ExerciseKind) -> Self {
        let (down, up) = kind.default_labels();
        Self::new(kind, down, up)
    }
}

pub fn default_exercises() -> Vec<ExerciseConfig> {
    ExerciseKind::ALL
        .into_iter()
        .map(ExerciseConfig::with_default_labels)
        .collect()
}

/// Per-frame output for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExerciseResult {
    pub kind: ExerciseKind,
    pub reps: u32,
    /// Combined smoothed confidence of the exercise's labels
    pub confidence: f32,
}

impl ExerciseResult {
    /// e.g. "Squats: 8"
    pub fn display_label(&self) -> String {
        format!("{}: {}", self.kind.display_name(), self.reps)
    }

    /// e.g. "squats_8"
    pub fn token(&self) -> String {
        format!("{}_{}", self.kind.token(), self.reps)
    }
}

/// Trailing decimal number of a display token, if any.
///
/// `"squats_8"` → `Some(8)`, `"squats"` → `None`.
pub fn parse_rep_suffix(token: &str) -> Option<u32> {
    let trimmed = token.trim_end();
    let digits = trimmed.len() - trimmed.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    trimmed[trimmed.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_labels() {
        assert_eq!(ExerciseKind::Squats.token(), "squats");
        assert_eq!(ExerciseKind::Pushups.default_labels(), ("pushups_down", "pushups_up"));
        assert_eq!(ExerciseKind::Pushups.to_string(), "Pushups");
    }

    #[test]
    fn test_from_token() {
        assert_eq!(ExerciseKind::from_token("squats_12"), Some(ExerciseKind::Squats));
        assert_eq!(ExerciseKind::from_token("pushups_down : 3 reps"), Some(ExerciseKind::Pushups));
        assert_eq!(ExerciseKind::from_token("lunges_4"), None);
    }

    #[test]
    fn test_result_formatting() {
        let r = ExerciseResult { kind: ExerciseKind::Squats, reps: 8, confidence: 0.9 };
        assert_eq!(r.display_label(), "Squats: 8");
        assert_eq!(r.token(), "squats_8");
        assert_eq!(parse_rep_suffix(&r.token()), Some(8));
    }

    #[test]
    fn test_parse_rep_suffix() {
        assert_eq!(parse_rep_suffix("pushups_42"), Some(42));
        assert_eq!(parse_rep_suffix("pushups_0 "), Some(0));
        assert_eq!(parse_rep_suffix("pushups"), None);
        assert_eq!(parse_rep_suffix("pushups_"), None);
        assert_eq!(parse_rep_suffix(""), None);
        assert_eq!(parse_rep_suffix("squats_99999999999999"), None);
    }

    #[test]
    fn test_default_exercises_in_declaration_order() {
        let exercises = default_exercises();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].kind, ExerciseKind::Squats);
        assert_eq!(exercises[1].up_label, "pushups_up");
    }

    #[test]
    fn test_exercise_config_deserialize() {
        let c: ExerciseConfig =
            toml::from_str("kind = \"pushups\"\ndown_label = \"pu_down\"\nup_label = \"pu_up\"").unwrap();
        assert_eq!(c, ExerciseConfig::new(ExerciseKind::Pushups, "pu_down", "pu_up"));
    }
}
