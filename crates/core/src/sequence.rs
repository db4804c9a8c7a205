pub const DEFAULT_SEQUENCE_MARKER: char = '#';

/// Replaces the first run of `marker` in `name` with `counter`, zero-padded to
/// the run length. Returns the new name and the next counter value; both are
/// unchanged when sequencing is off or there is no marker run.
pub fn apply_sequence(name: &str, counter: i64, enabled: bool, marker: char) -> (String, i64) {
    if !enabled {
        return (name.to_string(), counter);
    }

    let Some(start) = name.find(marker) else {
        return (name.to_string(), counter);
    };
    let run_len = name[start..].chars().take_while(|c| *c == marker).count();
    let end = start + run_len * marker.len_utf8();

    let mut out = String::with_capacity(name.len() + 4);
    out.push_str(&name[..start]);
    out.push_str(&pad_number(counter, run_len));
    out.push_str(&name[end..]);
    (out, counter.saturating_add(1))
}

fn pad_number(value: i64, width: usize) -> String {
    if value < 0 {
        format!("-{:0width$}", value.unsigned_abs(), width = width)
    } else {
        format!("{:0width$}", value, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(name: &str, counter: i64) -> (String, i64) {
        apply_sequence(name, counter, true, DEFAULT_SEQUENCE_MARKER)
    }

    #[test]
    fn disabled_is_noop() {
        assert_eq!(
            apply_sequence("dog##", 5, false, '#'),
            ("dog##".to_string(), 5)
        );
    }

    #[test]
    fn no_marker_consumes_nothing() {
        assert_eq!(seq("dog", 3), ("dog".to_string(), 3));
    }

    #[test]
    fn marker_positions() {
        assert_eq!(seq("Cat##Dog", 1), ("Cat01Dog".to_string(), 2));
        assert_eq!(seq("##Dog", 1), ("01Dog".to_string(), 2));
        assert_eq!(seq("Cat##", 9), ("Cat09".to_string(), 10));
    }

    #[test]
    fn value_wider_than_run_is_not_truncated() {
        assert_eq!(seq("dog#", 10), ("dog10".to_string(), 11));
        assert_eq!(seq("do##g", 123), ("do123g".to_string(), 124));
    }

    #[test]
    fn only_first_run_is_replaced() {
        assert_eq!(seq("a##b###c", 4), ("a04b###c".to_string(), 5));
    }

    #[test]
    fn negative_values_pad_magnitude() {
        assert_eq!(seq("n###", -2), ("n-002".to_string(), -1));
    }

    #[test]
    fn custom_marker() {
        assert_eq!(
            apply_sequence("img_@@@", 7, true, '@'),
            ("img_007".to_string(), 8)
        );
    }
}
