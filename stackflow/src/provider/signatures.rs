//! Recognisers for the provider's recoverable error signatures.
//!
//! The provider reports "stack does not exist" and "nothing to update" as
//! ordinary errors distinguished only by their text. Each signature has
//! exactly one predicate here; nothing else in the crate inspects provider
//! error text.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::ProviderError;

/// Structured code some transports attach to a missing-stack error.
pub const STACK_NOT_FOUND_CODE: &str = "StackNotFound";

static MISSING_RE: OnceLock<Regex> = OnceLock::new();
static NO_UPDATES_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn missing_pattern() -> &'static Regex {
    MISSING_RE.get_or_init(|| Regex::new(r"does not exist\.?$").expect("literal pattern"))
}

#[allow(clippy::expect_used)]
fn no_updates_pattern() -> &'static Regex {
    NO_UPDATES_RE.get_or_init(|| Regex::new(r"^No updates").expect("literal pattern"))
}

/// Returns true if a describe failure means the stack does not exist.
#[must_use]
pub fn is_stack_missing(err: &ProviderError) -> bool {
    err.code.as_deref() == Some(STACK_NOT_FOUND_CODE) || missing_pattern().is_match(err.message.trim_end())
}

/// Returns true if an update failure means there was nothing to change.
#[must_use]
pub fn is_no_updates(err: &ProviderError) -> bool {
    no_updates_pattern().is_match(&err.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_stack_message() {
        let err = ProviderError::new("Stack with id svc-dev-data does not exist");
        assert!(is_stack_missing(&err));
        assert!(!is_no_updates(&err));
    }

    #[test]
    fn test_missing_stack_code() {
        let err = ProviderError::new("not here").with_code(STACK_NOT_FOUND_CODE);
        assert!(is_stack_missing(&err));
    }

    #[test]
    fn test_missing_must_be_suffix() {
        let err = ProviderError::new("Bucket does not exist in region; retry later");
        assert!(!is_stack_missing(&err));
    }

    #[test]
    fn test_no_updates_prefix() {
        assert!(is_no_updates(&ProviderError::new("No updates are to be performed.")));
        assert!(!is_no_updates(&ProviderError::new("Error: No updates are to be performed.")));
        assert!(!is_no_updates(&ProviderError::new("Template format error")));
    }
}
