//! The set of built-in checks.

use crate::{ExtImport, GoGenerate, ImportAlias, Novendor, PtImports};
use gochecks_core::CheckBox;

/// Returns every built-in check, ordered by code.
#[must_use]
pub fn all_checks() -> Vec<CheckBox> {
    vec![
        Box::new(ExtImport::new()),
        Box::new(Novendor::new()),
        Box::new(ImportAlias::new()),
        Box::new(PtImports::new()),
        Box::new(GoGenerate::new()),
    ]
}

/// Looks up a built-in check by name or code.
#[must_use]
pub fn check_by_name(name: &str) -> Option<CheckBox> {
    all_checks()
        .into_iter()
        .find(|c| c.name() == name || c.code().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_ordered() {
        let codes: Vec<&str> = all_checks().iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec!["GC001", "GC002", "GC003", "GC004", "GC005"]);
    }

    #[test]
    fn lookup_by_name_or_code() {
        assert_eq!(check_by_name("novendor").map(|c| c.code()), Some("GC002"));
        assert_eq!(check_by_name("gc004").map(|c| c.name()), Some("ptimports"));
        assert_eq!(check_by_name("gogenerate").map(|c| c.code()), Some("GC005"));
        assert!(check_by_name("golint").is_none());
    }
}
