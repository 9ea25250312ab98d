//! Lifecycle statuses with a fixed transition table.

use super::ValidationError;

/// A status enum whose legal moves are listed per state.
///
/// Implementors only provide [`StateMachine::next_states`]; checks and
/// terminal detection derive from it.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + 'static {
    /// States reachable in one step. Empty for terminal states.
    fn next_states(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.next_states().contains(target)
    }

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            return Ok(target);
        }
        Err(ValidationError::invalid_format(
            "status",
            format!("{:?} cannot move to {:?}", self, target),
        ))
    }

    fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Off,
    }

    impl StateMachine for Light {
        fn next_states(&self) -> &'static [Self] {
            match self {
                Light::Red => &[Light::Green, Light::Off],
                Light::Green => &[Light::Red, Light::Off],
                Light::Off => &[],
            }
        }
    }

    #[test]
    fn listed_moves_are_allowed() {
        assert_eq!(Light::Red.transition_to(Light::Green), Ok(Light::Green));
        assert!(Light::Off.transition_to(Light::Red).is_err());
    }

    #[test]
    fn state_without_moves_is_terminal() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Green.is_terminal());
    }
}
