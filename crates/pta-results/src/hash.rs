//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

/// Hex SHA-256 over the boundary-condition table and the settings document.
pub fn compute_run_id(bc_csv: &str, settings_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bc_csv.as_bytes());
    // separator so moving bytes between the inputs changes the id
    hasher.update([0u8]);
    hasher.update(settings_yaml.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Include,Package Name\nYES,PKG1\n";
    const SETTINGS: &str = "version: 1\nproject_name: Board_01\n";

    #[test]
    fn hash_stability() {
        let a = compute_run_id(TABLE, SETTINGS);
        let b = compute_run_id(TABLE, SETTINGS);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = compute_run_id(TABLE, SETTINGS);
        let b = compute_run_id(TABLE, "version: 1\nproject_name: Board_02\n");
        let c = compute_run_id("Include,Package Name\nNO,PKG1\n", SETTINGS);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn inputs_are_not_concatenated() {
        assert_ne!(compute_run_id("ab", "c"), compute_run_id("a", "bc"));
    }

    #[test]
    fn digest_known_value() {
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
