//! Built-in suites for the marketing site and invitation flow

use crate::runner::TestCase;

pub mod cta;
pub mod invite;

/// Every built-in test, in run order
pub fn all() -> Vec<Box<dyn TestCase>> {
    let mut tests = cta::all();
    tests.extend(invite::all());
    tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let tests = all();
        let names: HashSet<_> = tests.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names.len(), tests.len());
        assert_eq!(tests.len(), 11);
        assert_eq!(tests[0].name(), "testStartFreeTrialFromHome");
    }
}
