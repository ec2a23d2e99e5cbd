//! Driver error catalog.
//!
//! Maps the detailed error codes reported by the tactor driver (its "last
//! error" value) to short descriptions. The table is static and sorted by
//! code, so lookups work before the driver has ever been initialized.

/// Description returned for codes that are not in the catalog.
pub const UNKNOWN_ERROR: &str = "Unknown error code.";

/// Driver was used before initialization.
pub const NO_INIT: i32 = 202000;
/// Device connection failed or the device is not connected.
pub const CONNECTION_ERROR: i32 = 202001;
/// A parameter was out of range.
pub const BAD_PARAMETER: i32 = 202002;
pub const INTERNAL_ERROR: i32 = 202003;
pub const PARTIAL_READ: i32 = 202004;
pub const NULL_HANDLE: i32 = 202005;
pub const WINDOWS_ERROR: i32 = 202006;
pub const TIMEOUT: i32 = 202007;
pub const NO_READ: i32 = 202008;
pub const FAILED_TO_CLOSE: i32 = 202009;
pub const MORE_TO_READ: i32 = 202010;
pub const FAILED_TO_READ: i32 = 202011;
pub const FAILED_TO_WRITE: i32 = 202012;
pub const NO_SUPPORTED_DRIVER: i32 = 202013;

/// Catalog entries, sorted by code.
static ENTRIES: &[(i32, &str)] = &[
    (NO_INIT, "No initialization."),
    (CONNECTION_ERROR, "Connection error."),
    (BAD_PARAMETER, "Bad parameter."),
    (INTERNAL_ERROR, "Internal error."),
    (PARTIAL_READ, "Partial read."),
    (NULL_HANDLE, "Null handle."),
    (WINDOWS_ERROR, "Windows error."),
    (TIMEOUT, "Timeout error."),
    (NO_READ, "No read."),
    (FAILED_TO_CLOSE, "Failed to close."),
    (MORE_TO_READ, "More to read."),
    (FAILED_TO_READ, "Failed to read."),
    (FAILED_TO_WRITE, "Failed to write."),
    (NO_SUPPORTED_DRIVER, "No supported driver."),
];

/// Look up the description for a driver error code.
///
/// Never fails: codes missing from the catalog map to [`UNKNOWN_ERROR`].
pub fn describe(code: i32) -> &'static str {
    lookup(code).unwrap_or(UNKNOWN_ERROR)
}

fn lookup(code: i32) -> Option<&'static str> {
    ENTRIES
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|idx| ENTRIES[idx].1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn entries_sorted_and_unique() {
        for pair in ENTRIES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} before {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn known_codes() {
        assert_eq!(describe(NO_INIT), "No initialization.");
        assert_eq!(describe(CONNECTION_ERROR), "Connection error.");
        assert_eq!(describe(NO_SUPPORTED_DRIVER), "No supported driver.");
    }

    #[test]
    fn every_entry_resolves() {
        for &(code, text) in ENTRIES {
            assert_eq!(describe(code), text);
        }
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(describe(0), UNKNOWN_ERROR);
        assert_eq!(describe(-1), UNKNOWN_ERROR);
        assert_eq!(describe(201999), UNKNOWN_ERROR);
        assert_eq!(describe(202014), UNKNOWN_ERROR);
        assert!(lookup(202014).is_none());
    }

    proptest! {
        #[test]
        fn describe_is_total(code in any::<i32>()) {
            prop_assert!(!describe(code).is_empty());
        }
    }
}
