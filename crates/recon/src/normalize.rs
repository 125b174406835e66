/// Canonical comparison key for item names.
///
/// Lowercases, trims, and collapses every internal whitespace run to a single
/// space. Recipe names and POS item names go through the same function so
/// both sides of the join share one key space.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for word in lowered.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  Cheeseburger "), "cheeseburger");
        assert_eq!(normalize("BLT"), "blt");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("Double \t  Bacon\nBurger"), "double bacon burger");
        assert_eq!(normalize("Fish\u{00a0}\u{00a0}Tacos"), "fish tacos");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn distinct_spellings_share_a_key() {
        assert_eq!(normalize("Chicken  Wings"), normalize("chicken wings "));
    }

    proptest! {
        #[test]
        fn idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn no_edge_or_double_spaces(s in "[ \\ta-zA-Z\\n]{0,40}") {
            let key = normalize(&s);
            prop_assert!(!key.starts_with(' '));
            prop_assert!(!key.ends_with(' '));
            prop_assert!(!key.contains("  "));
        }
    }
}
