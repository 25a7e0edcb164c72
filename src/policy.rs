use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::{ReferenceText, TypedInput};

/// Default length of a timed session when none is configured.
pub const DEFAULT_TIMED_SECS: u64 = 30;

/// Durations offered for timed sessions.
pub const TIMED_DURATIONS: [u64; 4] = [15, 30, 60, 90];

/// User-facing rule variants.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Corrections allowed, ends on stop (or on a configured duration).
    Easy,
    /// No backspace, ends when the whole text is typed.
    Hard,
    /// Corrections allowed, ends when the clock runs out.
    Timed,
    /// Like easy, on a code snippet, ends when the whole snippet is typed.
    Code,
}

/// Why an edit was refused. Rejections are not errors: the edit is simply
/// discarded and the session is left as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EditRejection {
    #[error("corrections are not allowed in this mode")]
    Shortened,
    #[error("already typed characters cannot be changed in this mode")]
    Rewritten,
    #[error("time is up")]
    TimeExpired,
    #[error("input would run past the end of the text")]
    ExceedsReference,
}

/// A proposed replacement of the typed input.
#[derive(Clone, Copy, Debug)]
pub struct EditProposal<'a> {
    pub reference: &'a ReferenceText,
    pub current: &'a TypedInput,
    pub proposed: &'a TypedInput,
    pub remaining: Option<Duration>,
}

/// Where a session stands, for completion checks.
#[derive(Clone, Copy, Debug)]
pub struct Progress<'a> {
    pub reference: &'a ReferenceText,
    pub input: &'a TypedInput,
    pub remaining: Option<Duration>,
}

/// One rule of a policy. A policy accepts an edit only if every rule does,
/// and is complete as soon as any rule says so.
pub trait EditRule: Debug + Send + Sync {
    fn validate_edit(&self, _edit: &EditProposal<'_>) -> Result<(), EditRejection> {
        Ok(())
    }

    fn is_complete(&self, _progress: &Progress<'_>) -> bool {
        false
    }
}

/// Input may never grow past the reference text.
#[derive(Debug)]
pub struct WithinReference;

impl EditRule for WithinReference {
    fn validate_edit(&self, edit: &EditProposal<'_>) -> Result<(), EditRejection> {
        if edit.proposed.len() > edit.reference.len() {
            return Err(EditRejection::ExceedsReference);
        }
        Ok(())
    }
}

/// Input only ever grows: no deletion, no rewriting of typed characters.
#[derive(Debug)]
pub struct NoCorrection;

impl EditRule for NoCorrection {
    fn validate_edit(&self, edit: &EditProposal<'_>) -> Result<(), EditRejection> {
        if edit.proposed.len() < edit.current.len() {
            return Err(EditRejection::Shortened);
        }
        if !edit.proposed.chars().starts_with(edit.current.chars()) {
            return Err(EditRejection::Rewritten);
        }
        Ok(())
    }
}

/// Session ends once the whole text has been typed.
#[derive(Debug)]
pub struct FullLength;

impl EditRule for FullLength {
    fn is_complete(&self, progress: &Progress<'_>) -> bool {
        progress.input.len() == progress.reference.len()
    }
}

/// Session is bounded by the clock.
#[derive(Debug)]
pub struct DurationBound;

impl DurationBound {
    fn exhausted(remaining: Option<Duration>) -> bool {
        remaining.is_some_and(|r| r.is_zero())
    }
}

impl EditRule for DurationBound {
    fn validate_edit(&self, edit: &EditProposal<'_>) -> Result<(), EditRejection> {
        if Self::exhausted(edit.remaining) {
            return Err(EditRejection::TimeExpired);
        }
        Ok(())
    }

    fn is_complete(&self, progress: &Progress<'_>) -> bool {
        Self::exhausted(progress.remaining)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Correction {
    Free,
    Forbidden,
}

/// Rule set of a session: a correction rule, an optional timing rule and
/// an optional length-completion rule.
#[derive(Debug)]
pub struct ModePolicy {
    mode: Mode,
    correction: Correction,
    completes_at_length: bool,
    duration: Option<Duration>,
    rules: Vec<Box<dyn EditRule>>,
}

impl ModePolicy {
    fn assemble(
        mode: Mode,
        correction: Correction,
        completes_at_length: bool,
        duration: Option<Duration>,
    ) -> Self {
        let mut rules: Vec<Box<dyn EditRule>> = Vec::new();
        if duration.is_some() {
            rules.push(Box::new(DurationBound));
        }
        rules.push(Box::new(WithinReference));
        if correction == Correction::Forbidden {
            rules.push(Box::new(NoCorrection));
        }
        if completes_at_length {
            rules.push(Box::new(FullLength));
        }

        Self {
            mode,
            correction,
            completes_at_length,
            duration,
            rules,
        }
    }

    pub fn free() -> Self {
        Self::assemble(Mode::Easy, Correction::Free, false, None)
    }

    pub fn no_correction() -> Self {
        Self::assemble(Mode::Hard, Correction::Forbidden, true, None)
    }

    pub fn duration_bounded(duration: Duration) -> Self {
        Self::assemble(Mode::Timed, Correction::Free, false, Some(duration))
    }

    pub fn snippet() -> Self {
        Self::assemble(Mode::Code, Correction::Free, true, None)
    }

    /// Pair this policy's correction rule with a timing rule.
    pub fn with_duration(self, duration: Duration) -> Self {
        Self::assemble(
            self.mode,
            self.correction,
            self.completes_at_length,
            Some(duration),
        )
    }

    /// Policy for a configured mode. Timed sessions without a duration use
    /// [`DEFAULT_TIMED_SECS`].
    pub fn for_mode(mode: Mode, duration: Option<Duration>) -> Self {
        let policy = match mode {
            Mode::Easy => Self::free(),
            Mode::Hard => Self::no_correction(),
            Mode::Code => Self::snippet(),
            Mode::Timed => {
                return Self::duration_bounded(
                    duration.unwrap_or(Duration::from_secs(DEFAULT_TIMED_SECS)),
                )
            }
        };
        match duration {
            Some(d) => policy.with_duration(d),
            None => policy,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn allows_correction(&self) -> bool {
        self.correction == Correction::Free
    }

    /// False when only an explicit stop can end the session.
    pub fn finishes_on_its_own(&self) -> bool {
        self.completes_at_length || self.duration.is_some()
    }

    pub fn validate_edit(&self, edit: &EditProposal<'_>) -> Result<(), EditRejection> {
        self.rules.iter().try_for_each(|rule| rule.validate_edit(edit))
    }

    pub fn is_complete(&self, progress: &Progress<'_>) -> bool {
        self.rules.iter().any(|rule| rule.is_complete(progress))
    }
}

impl Clone for ModePolicy {
    fn clone(&self) -> Self {
        Self::assemble(
            self.mode,
            self.correction,
            self.completes_at_length,
            self.duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn reference(s: &str) -> ReferenceText {
        ReferenceText::new(s).unwrap()
    }

    fn check(
        policy: &ModePolicy,
        reference: &ReferenceText,
        current: &str,
        proposed: &str,
        remaining: Option<Duration>,
    ) -> Result<(), EditRejection> {
        let current = TypedInput::from(current);
        let proposed = TypedInput::from(proposed);
        policy.validate_edit(&EditProposal {
            reference,
            current: &current,
            proposed: &proposed,
            remaining,
        })
    }

    fn complete(
        policy: &ModePolicy,
        reference: &ReferenceText,
        input: &str,
        remaining: Option<Duration>,
    ) -> bool {
        let input = TypedInput::from(input);
        policy.is_complete(&Progress {
            reference,
            input: &input,
            remaining,
        })
    }

    #[test]
    fn free_accepts_shortening_and_never_completes() {
        let policy = ModePolicy::free();
        let r = reference("cat");
        assert_eq!(check(&policy, &r, "cax", "ca", None), Ok(()));
        assert!(!complete(&policy, &r, "cat", None));
        assert!(policy.allows_correction());
    }

    #[test]
    fn every_policy_rejects_overflow() {
        let r = reference("cat");
        for policy in [
            ModePolicy::free(),
            ModePolicy::no_correction(),
            ModePolicy::snippet(),
            ModePolicy::duration_bounded(Duration::from_secs(5)),
        ] {
            assert_matches!(
                check(&policy, &r, "cat", "cats", Some(Duration::from_secs(1))),
                Err(EditRejection::ExceedsReference)
            );
        }
    }

    #[test]
    fn no_correction_rejects_shortening() {
        let policy = ModePolicy::no_correction();
        let r = reference("cat");
        assert_matches!(
            check(&policy, &r, "cax", "ca", None),
            Err(EditRejection::Shortened)
        );
        assert_eq!(check(&policy, &r, "ca", "cax", None), Ok(()));
        assert!(!policy.allows_correction());
    }

    #[test]
    fn no_correction_rejects_rewrites() {
        let policy = ModePolicy::no_correction();
        let r = reference("cat");
        assert_matches!(
            check(&policy, &r, "cx", "ca", None),
            Err(EditRejection::Rewritten)
        );
        assert_matches!(
            check(&policy, &r, "cx", "cat", None),
            Err(EditRejection::Rewritten)
        );
        assert_eq!(check(&policy, &r, "cx", "cxt", None), Ok(()));

        // free typing may rewrite
        assert_eq!(check(&ModePolicy::free(), &r, "cx", "ca", None), Ok(()));
    }

    #[test]
    fn only_free_typing_needs_a_stop() {
        assert!(!ModePolicy::free().finishes_on_its_own());
        assert!(ModePolicy::no_correction().finishes_on_its_own());
        assert!(ModePolicy::snippet().finishes_on_its_own());
        assert!(ModePolicy::duration_bounded(Duration::from_secs(15)).finishes_on_its_own());
        assert!(ModePolicy::free()
            .with_duration(Duration::from_secs(15))
            .finishes_on_its_own());
    }

    #[test]
    fn no_correction_completes_at_full_length() {
        let policy = ModePolicy::no_correction();
        let r = reference("cat");
        assert!(!complete(&policy, &r, "ca", None));
        assert!(complete(&policy, &r, "cax", None));
    }

    #[test]
    fn duration_bound_rejects_after_expiry() {
        let policy = ModePolicy::duration_bounded(Duration::from_secs(10));
        let r = reference("hello world");
        assert_eq!(check(&policy, &r, "", "h", Some(Duration::from_secs(1))), Ok(()));
        assert_matches!(
            check(&policy, &r, "", "h", Some(Duration::ZERO)),
            Err(EditRejection::TimeExpired)
        );
        assert!(complete(&policy, &r, "", Some(Duration::ZERO)));
        assert!(!complete(&policy, &r, "hello world", Some(Duration::from_secs(2))));
    }

    #[test]
    fn snippet_behaves_like_free_but_completes_at_length() {
        let policy = ModePolicy::snippet();
        let r = reference("fn x() {}");
        assert_eq!(check(&policy, &r, "fn y", "fn ", None), Ok(()));
        assert!(complete(&policy, &r, "fn x() {}", None));
        assert_eq!(policy.mode(), Mode::Code);
    }

    #[test]
    fn combined_policy_completes_on_either_condition() {
        let policy = ModePolicy::no_correction().with_duration(Duration::from_secs(30));
        let r = reference("ab");
        assert_eq!(policy.mode(), Mode::Hard);
        assert_eq!(policy.duration(), Some(Duration::from_secs(30)));
        assert!(complete(&policy, &r, "ab", Some(Duration::from_secs(3))));
        assert!(complete(&policy, &r, "a", Some(Duration::ZERO)));
        assert!(!complete(&policy, &r, "a", Some(Duration::from_secs(3))));
    }

    #[test]
    fn for_mode_builds_expected_policies() {
        let timed = ModePolicy::for_mode(Mode::Timed, None);
        assert_eq!(timed.duration(), Some(Duration::from_secs(DEFAULT_TIMED_SECS)));

        let easy = ModePolicy::for_mode(Mode::Easy, Some(Duration::from_secs(15)));
        assert_eq!(easy.mode(), Mode::Easy);
        assert_eq!(easy.duration(), Some(Duration::from_secs(15)));

        let hard = ModePolicy::for_mode(Mode::Hard, None);
        assert_eq!(hard.duration(), None);
    }

    #[test]
    fn clone_keeps_rules() {
        let policy = ModePolicy::no_correction().clone();
        let r = reference("cat");
        assert_matches!(
            check(&policy, &r, "ca", "c", None),
            Err(EditRejection::Shortened)
        );
    }

    #[test]
    fn mode_display_is_lowercase() {
        assert_eq!(Mode::Timed.to_string(), "timed");
        assert_eq!(Mode::Code.to_string(), "code");
    }
}
