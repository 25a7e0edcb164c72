use std::fmt;
use std::sync::Arc;

use crate::error::ContentError;

/// The passage a user has to reproduce. Never empty, never mutated.
///
/// Clones share the underlying characters, so handing the same text to a
/// restarted session is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceText {
    chars: Arc<[char]>,
}

impl ReferenceText {
    pub fn new(text: impl AsRef<str>) -> Result<Self, ContentError> {
        let chars: Arc<[char]> = text.as_ref().chars().collect();
        if chars.is_empty() {
            return Err(ContentError::Empty);
        }
        Ok(Self { chars })
    }

    /// For compile-time passages known to be non-empty.
    pub(crate) fn from_static(text: &'static str) -> Self {
        debug_assert!(!text.is_empty());
        Self {
            chars: text.chars().collect(),
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters (not bytes).
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    /// Rough word count, used for display only.
    pub fn word_count(&self) -> usize {
        self.to_string().split_whitespace().count()
    }
}

impl fmt::Display for ReferenceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// What the user has typed so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedInput {
    chars: Vec<char>,
}

impl TypedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Copy with one more character appended.
    pub fn pushed(&self, c: char) -> Self {
        let mut chars = self.chars.clone();
        chars.push(c);
        Self { chars }
    }

    /// Copy with the last character removed (unchanged when empty).
    pub fn popped(&self) -> Self {
        let mut chars = self.chars.clone();
        chars.pop();
        Self { chars }
    }
}

impl From<&str> for TypedInput {
    fn from(value: &str) -> Self {
        Self {
            chars: value.chars().collect(),
        }
    }
}

impl From<String> for TypedInput {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl From<Vec<char>> for TypedInput {
    fn from(chars: Vec<char>) -> Self {
        Self { chars }
    }
}

impl fmt::Display for TypedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}
