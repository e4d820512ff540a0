/// Parse one of the canonical textual booleans
///
/// Accepts `1, t, T, TRUE, true, True` and `0, f, F, FALSE, false, False`.
/// Anything else, including surrounding whitespace, is rejected.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn accepts_canonical_spellings() {
        for value in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for value in ["", "yes", "no", "on", "tRuE", " true", "2", "-1", "null"] {
            assert_eq!(parse_bool(value), None, "{value:?}");
        }
    }
}
