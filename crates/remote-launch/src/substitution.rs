//! Deferred find/replace over fragment sequences

use crate::fragment::{Fragment, Fragments};

/// Wrap `fragments` so that, once resolved, every non-overlapping occurrence
/// of `find` (scanned left to right) is replaced with `replace`
///
/// The result is itself a fragment sequence, so calls chain:
/// `substitute(substitute(host, ".", "_"), "-", "_")`. An empty `find`
/// leaves the text unchanged.
pub fn substitute(fragments: impl Into<Fragments>, find: &str, replace: &str) -> Fragments {
    Fragments::from(Fragment::Replace {
        find: find.to_string(),
        replace: replace.to_string(),
        inner: fragments.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::ResolutionContext;

    fn resolve(fragments: &Fragments) -> String {
        fragments.resolve(&ResolutionContext::new()).unwrap()
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let out = substitute("10.0.0.5", ".", "_");
        assert_eq!(resolve(&out), "10_0_0_5");
    }

    #[test]
    fn test_non_overlapping_left_to_right() {
        assert_eq!(resolve(&substitute("aaaa", "aa", "b")), "bb");
        assert_eq!(resolve(&substitute("aaa", "aa", "b")), "ba");
    }

    #[test]
    fn test_replacement_is_literal_not_pattern() {
        assert_eq!(resolve(&substitute("a.b*c", "*", "$1")), "a.b$1c");
    }

    #[test]
    fn test_empty_find_is_identity() {
        assert_eq!(resolve(&substitute("robot", "", "_")), "robot");
    }

    #[test]
    fn test_chained_substitutions() {
        let once = substitute("my-robot.local", ".", "_");
        let twice = substitute(once, "-", "_");
        assert_eq!(resolve(&twice), "my_robot_local");
    }

    #[test]
    fn test_applies_to_late_bound_values() {
        let host = Fragments::reference("host");
        let name = substitute(host.with_str(".lan"), ".", "_");
        let ctx = ResolutionContext::new().with_var("host", "robot.one");
        assert_eq!(name.resolve(&ctx).unwrap(), "robot_one_lan");
    }
}
