//! Dialog stages.

use serde::{Deserialize, Serialize};

use super::conversation::Field;

/// The stages of the checklist conversation.
///
/// Progresses linearly: AwaitingName → AwaitingArea → AwaitingGoal →
/// AwaitingMortgage → AwaitingPhone → Completed. Any non-terminal stage may
/// also drop to Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingName,
    AwaitingArea,
    AwaitingGoal,
    AwaitingMortgage,
    AwaitingPhone,
    Completed,
    Cancelled,
}

impl Stage {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// AwaitingPhone is the only stage allowed to loop on itself (rejected
    /// phone input).
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        if target == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (AwaitingName, AwaitingArea)
                | (AwaitingArea, AwaitingGoal)
                | (AwaitingGoal, AwaitingMortgage)
                | (AwaitingMortgage, AwaitingPhone)
                | (AwaitingPhone, AwaitingPhone)
                | (AwaitingPhone, Completed)
        )
    }

    /// Whether the conversation is over in this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Next stage in the linear progression, if any.
    pub fn next(&self) -> Option<Stage> {
        use Stage::*;
        match self {
            AwaitingName => Some(AwaitingArea),
            AwaitingArea => Some(AwaitingGoal),
            AwaitingGoal => Some(AwaitingMortgage),
            AwaitingMortgage => Some(AwaitingPhone),
            AwaitingPhone => Some(Completed),
            Completed | Cancelled => None,
        }
    }

    /// The field this stage collects.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::AwaitingName => Some(Field::Name),
            Self::AwaitingArea => Some(Field::Area),
            Self::AwaitingGoal => Some(Field::Goal),
            Self::AwaitingMortgage => Some(Field::Mortgage),
            Self::AwaitingPhone => Some(Field::Phone),
            Self::Completed | Self::Cancelled => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingArea => "awaiting_area",
            Self::AwaitingGoal => "awaiting_goal",
            Self::AwaitingMortgage => "awaiting_mortgage",
            Self::AwaitingPhone => "awaiting_phone",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Stage; 7] = [
        Stage::AwaitingName,
        Stage::AwaitingArea,
        Stage::AwaitingGoal,
        Stage::AwaitingMortgage,
        Stage::AwaitingPhone,
        Stage::Completed,
        Stage::Cancelled,
    ];

    #[test]
    fn valid_transitions() {
        use Stage::*;
        let transitions = [
            (AwaitingName, AwaitingArea),
            (AwaitingArea, AwaitingGoal),
            (AwaitingGoal, AwaitingMortgage),
            (AwaitingMortgage, AwaitingPhone),
            (AwaitingPhone, AwaitingPhone),
            (AwaitingPhone, Completed),
        ];
        for (from, to) in transitions {
            assert!(
                from.can_transition_to(to),
                "{from} should transition to {to}"
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use Stage::*;
        // Skip stages
        assert!(!AwaitingName.can_transition_to(AwaitingGoal));
        assert!(!AwaitingMortgage.can_transition_to(Completed));
        // Go backward
        assert!(!AwaitingArea.can_transition_to(AwaitingName));
        // Self-loop outside the phone gate
        assert!(!AwaitingName.can_transition_to(AwaitingName));
        // Out of terminal stages
        assert!(!Completed.can_transition_to(AwaitingName));
        assert!(!Cancelled.can_transition_to(AwaitingName));
    }

    #[test]
    fn cancel_allowed_only_from_non_terminal() {
        for stage in ALL {
            assert_eq!(
                stage.can_transition_to(Stage::Cancelled),
                !stage.is_terminal(),
                "{stage}"
            );
        }
    }

    #[test]
    fn next_walks_all_stages() {
        use Stage::*;
        let expected = [
            AwaitingArea,
            AwaitingGoal,
            AwaitingMortgage,
            AwaitingPhone,
            Completed,
        ];
        let mut current = AwaitingName;
        for expected_next in expected {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(Cancelled.next().is_none());
    }

    #[test]
    fn only_collecting_stages_have_fields() {
        assert_eq!(Stage::AwaitingName.field(), Some(Field::Name));
        assert_eq!(Stage::AwaitingPhone.field(), Some(Field::Phone));
        assert_eq!(Stage::Completed.field(), None);
        assert_eq!(Stage::Cancelled.field(), None);
    }

    #[test]
    fn display_matches_serde() {
        for stage in ALL {
            let display = format!("{stage}");
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {stage:?}"
            );
        }
    }
}
