/// Property tests for length repair
use billcopy::contexts::constraint_enforcer::{measure, repair};
use billcopy::data::Unit;
use proptest::prelude::*;

proptest! {
    #[test]
    fn characters_never_exceed_bound(s in "\\PC{0,200}", bound in 1usize..120) {
        let repaired = repair(&s, bound, Unit::Characters);
        prop_assert!(repaired.chars().count() <= bound);
    }

    #[test]
    fn characters_within_bound_are_untouched(s in "\\PC{0,60}", extra in 0usize..20) {
        let bound = s.chars().count().max(1) + extra;
        prop_assert_eq!(repair(&s, bound, Unit::Characters), s);
    }

    #[test]
    fn words_never_exceed_bound(s in "([a-z]{1,8}[ \\t\\n]{1,3}){0,40}", bound in 1usize..30) {
        let repaired = repair(&s, bound, Unit::Words);
        prop_assert!(measure(&repaired, Unit::Words) <= bound);
    }

    #[test]
    fn words_within_bound_keep_their_tokens(s in "([a-z]{1,8} {1,3}){0,10}", extra in 0usize..5) {
        let bound = measure(&s, Unit::Words).max(1) + extra;
        let repaired = repair(&s, bound, Unit::Words);
        let before: Vec<&str> = s.split_whitespace().collect();
        let after: Vec<&str> = repaired.split_whitespace().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn repair_is_idempotent(s in "[a-zA-Zé ,.]{0,150}", bound in 1usize..100, words in any::<bool>()) {
        let unit = if words { Unit::Words } else { Unit::Characters };
        let once = repair(&s, bound, unit);
        let twice = repair(&once, bound, unit);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn mid_word_cut_backs_up_to_late_space(
        head in "[a-z]{16,19}",
        tail in "[a-z]{5,10}",
    ) {
        // The only space sits at index head.len() (16..=19), at or past 0.8 * 20
        let s = format!("{} {}", head, tail);
        let repaired = repair(&s, 20, Unit::Characters);
        prop_assert_eq!(repaired, head);
    }
}

#[test]
fn example_scenario_characters() {
    let repaired = repair("The quick brown fox jumps", 20, Unit::Characters);
    assert!(repaired.chars().count() <= 20);
    assert!(!repaired.ends_with(' '));
    assert_eq!(repaired, "The quick brown fox");
}

#[test]
fn example_scenario_words() {
    assert_eq!(repair("one two three four five", 3, Unit::Words), "one two three");
}
