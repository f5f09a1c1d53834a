//! Property-based tests for path handling and template rendering.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{names, normalize_path, offset_from_root};
    use crate::template::{render, Substitutions};
    use proptest::prelude::*;

    // ============================================================================
    // normalize_path property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing twice gives the same result as normalizing once
        #[test]
        fn normalize_path_is_idempotent(input in "[a-z./\\\\]{0,24}") {
            if let Ok(once) = normalize_path(&input) {
                let twice = normalize_path(&once);
                prop_assert_eq!(twice.ok(), Some(once));
            }
        }

        /// Property: a normalized path has no empty, `.` or `..` segments
        #[test]
        fn normalize_path_output_is_clean(input in "[a-z./]{0,24}") {
            if let Ok(normalized) = normalize_path(&input) {
                prop_assert!(!normalized.starts_with('/'));
                prop_assert!(!normalized.ends_with('/'));
                prop_assert!(!normalized.contains('\\'));
                if !normalized.is_empty() {
                    for segment in normalized.split('/') {
                        prop_assert!(!segment.is_empty());
                        prop_assert!(segment != "." && segment != "..");
                    }
                }
            }
        }

        /// Property: plain segments joined by `/` are already normalized
        #[test]
        fn normalize_path_keeps_plain_paths(segments in prop::collection::vec("[a-z0-9_-]{1,8}", 1..5)) {
            let path = segments.join("/");
            prop_assert_eq!(normalize_path(&path).unwrap(), path);
        }

        /// Property: the offset climbs one level per segment
        #[test]
        fn offset_from_root_matches_depth(segments in prop::collection::vec("[a-z]{1,6}", 1..5)) {
            let offset = offset_from_root(&segments.join("/"));
            prop_assert_eq!(offset, "../".repeat(segments.len()));
        }
    }

    // ============================================================================
    // names property tests
    // ============================================================================

    proptest! {
        /// Property: the file name of a kebab-case name is the name itself
        #[test]
        fn names_file_name_of_kebab_is_identity(name in "[a-z][a-z0-9]{0,6}(-[a-z][a-z0-9]{0,6}){0,3}") {
            prop_assert_eq!(names(&name).file_name, name);
        }

        /// Property: class and property names differ only in the first letter
        #[test]
        fn names_class_and_property_agree(name in "[a-z][a-z0-9]{0,6}(-[a-z][a-z0-9]{0,6}){0,3}") {
            let n = names(&name);
            prop_assert_eq!(n.class_name.to_lowercase(), n.property_name.to_lowercase());
            prop_assert!(n.class_name.starts_with(|c: char| c.is_ascii_uppercase()));
            prop_assert!(!n.property_name.contains('-'));
        }
    }

    // ============================================================================
    // render property tests
    // ============================================================================

    proptest! {
        /// Property: content without tags renders unchanged
        #[test]
        fn render_without_tags_is_identity(content in "[^<%]{0,64}") {
            let rendered = render(&content, &Substitutions::new(), "t").unwrap();
            prop_assert_eq!(rendered, content);
        }

        /// Property: substitution is a single pass; tag-like values are not re-expanded
        #[test]
        fn render_is_single_pass(value in "[a-z]{0,8}") {
            let tagged = format!("<%= {} %>", value);
            let substitutions = Substitutions::from([
                ("a".to_string(), tagged.clone()),
            ]);
            let rendered = render("x<%= a %>y", &substitutions, "t").unwrap();
            prop_assert_eq!(rendered, format!("x{}y", tagged));
        }

        /// Property: a bound tag is replaced by exactly its value
        #[test]
        fn render_replaces_bound_key(key in "[a-zA-Z_][a-zA-Z0-9_]{0,10}", value in "[ -~]{0,16}") {
            let substitutions = Substitutions::from([(key.clone(), value.clone())]);
            let rendered = render(&format!("<%={}%>", key), &substitutions, "t").unwrap();
            prop_assert_eq!(rendered, value);
        }
    }
}
