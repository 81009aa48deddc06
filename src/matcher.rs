use itertools::{EitherOrBoth, Itertools};

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum LetterState {
    Correct,
    Incorrect,
    Pending,
}

/// The word on screen and what the player has typed against it so far.
///
/// Both strings are lowercased; `letter_states` is index-aligned with
/// `target_word` (one entry per char).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedWord {
    pub target_word: String,
    pub typed_text: String,
    pub letter_states: Vec<LetterState>,
}

impl TypedWord {
    pub fn new(target: &str) -> Self {
        let target_word = target.to_lowercase();
        let letter_states = vec![LetterState::Pending; target_word.chars().count()];

        Self {
            target_word,
            typed_text: String::new(),
            letter_states,
        }
    }

    /// A word attempt is over once as many chars as the target were typed,
    /// right or wrong.
    pub fn is_complete(&self) -> bool {
        !self.letter_states.is_empty()
            && self.typed_text.chars().count() >= self.letter_states.len()
    }

    pub fn correct_chars(&self) -> usize {
        self.letter_states
            .iter()
            .filter(|s| **s == LetterState::Correct)
            .count()
    }

    pub fn is_perfect(&self) -> bool {
        self.typed_text == self.target_word
    }
}

/// Compare raw input against the target, case-insensitively
pub fn match_input(target: &str, raw: &str) -> TypedWord {
    let target_word = target.to_lowercase();
    let typed_text = raw.to_lowercase();

    // extra chars past the end of the target are ignored here
    let letter_states = target_word
        .chars()
        .zip_longest(typed_text.chars())
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(expected, typed) if expected == typed => Some(LetterState::Correct),
            EitherOrBoth::Both(_, _) => Some(LetterState::Incorrect),
            EitherOrBoth::Left(_) => Some(LetterState::Pending),
            EitherOrBoth::Right(_) => None,
        })
        .collect();

    TypedWord {
        target_word,
        typed_text,
        letter_states,
    }
}
