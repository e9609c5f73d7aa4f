//! Human readable byte counts using 1024-based units

const UNITS: [(u64, &str); 3] = [
    (bytesize::GIB, "GB"),
    (bytesize::MIB, "MB"),
    (bytesize::KIB, "KB"),
];

/// Format a byte count for progress and summary output.
///
/// Counts below 1024 are shown verbatim (`"512 bytes"`), anything larger is scaled to the
/// largest fitting unit up to GB with two decimal places (`"1.50 KB"`).
pub fn format_size(bytes: u64) -> String {
    for (unit, name) in UNITS {
        if bytes >= unit {
            return format!("{:.2} {}", bytes as f64 / unit as f64, name);
        }
    }
    format!("{bytes} bytes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_unit_boundaries() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn gigabytes_are_the_largest_unit() {
        assert_eq!(format_size(2048 * bytesize::GIB), "2048.00 GB");
    }

    proptest! {
        #[test]
        fn small_counts_are_plain_bytes(bytes in 0u64..1024) {
            prop_assert_eq!(format_size(bytes), format!("{bytes} bytes"));
        }

        #[test]
        fn large_counts_use_two_decimals(bytes in 1024u64..u64::MAX) {
            let formatted = format_size(bytes);
            let (value, unit) = formatted.split_once(' ').unwrap();
            prop_assert!(["KB", "MB", "GB"].contains(&unit));
            let (_, decimals) = value.split_once('.').unwrap();
            prop_assert_eq!(decimals.len(), 2);
        }
    }
}
