//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a plain path segment (never `.` or `..`)
    pub fn path_segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,10}"
    }

    /// Generate a final glob component such as `*.so` or `lib?_x*`
    pub fn glob_component() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,4}".prop_map(|ext| format!("*.{ext}")),
            "[a-z]{1,6}".prop_map(|stem| format!("{stem}*")),
            "[a-z]{1,3}".prop_map(|stem| format!("{stem}?.py")),
        ]
    }

    /// Generate a valid layer name
    pub fn layer_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,20}"
    }

    /// Generate a relative file path of 1-4 segments
    pub fn relative_file() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(path_segment(), 1..4)
    }

    /// Generate file contents
    pub fn file_content() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..256)
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_path_segment_generator(segment in path_segment()) {
            prop_assert!(!segment.is_empty());
            prop_assert!(segment != "." && segment != "..");
            prop_assert!(!segment.contains('/'));
        }

        #[test]
        fn test_glob_component_generator(component in glob_component()) {
            prop_assert!(crate::core::rule::has_wildcard(&component));
            prop_assert!(!component.contains('/'));
        }

        #[test]
        fn test_layer_name_generator(name in layer_name()) {
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
        }
    }
}
