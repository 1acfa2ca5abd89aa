//! Property tests for status code translation

use ortcl_core::status::UNKNOWN;
use ortcl_core::{error_string, ErrorCategory, StatusCode};
use proptest::prelude::*;

fn known_code() -> impl Strategy<Value = StatusCode> {
    prop::sample::select(StatusCode::KNOWN.to_vec())
}

proptest! {
    #[test]
    fn test_translation_is_total(code in any::<i32>()) {
        let name = error_string(StatusCode(code));
        prop_assert!(!name.is_empty());
        prop_assert!(name == UNKNOWN || name.starts_with("CL_"));
    }

    #[test]
    fn test_unlisted_codes_are_unknown(code in any::<i32>()) {
        let status = StatusCode(code);
        prop_assume!(!StatusCode::KNOWN.contains(&status));
        prop_assert_eq!(error_string(status), UNKNOWN);
        prop_assert_eq!(status.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_listed_codes_have_a_category(status in known_code()) {
        prop_assert_ne!(status.name(), UNKNOWN);
        prop_assert_ne!(status.category(), ErrorCategory::Unknown);
        prop_assert_eq!(status.category() == ErrorCategory::Success, status.is_success());
    }

    #[test]
    fn test_display_carries_name_and_code(code in -80i32..=10) {
        let status = StatusCode(code);
        prop_assert_eq!(status.to_string(), format!("{} ({})", error_string(status), code));
    }
}

#[test]
fn test_codes_past_the_table_are_unknown() {
    for code in [-20, -29, -69, -70, -71, -72, -1000, 1] {
        assert_eq!(error_string(StatusCode(code)), UNKNOWN, "code {code}");
    }
}
