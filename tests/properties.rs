//! End-to-end properties of the public API: soundness of value and
//! cost, seeder dominance, cache exactness, and text round-trips.

use mulseq::{
    parse_sequence, sequence_cost, sequence_to_string, sequence_value, MultSearch, CHAINED_ADDS,
    DEFAULT_PROFILE,
};

#[test]
fn search_results_are_sound() {
    let mut engine = MultSearch::new(DEFAULT_PROFILE);
    for n in 2..=200i64 {
        let (cost, instrs) = engine.find_sequence(n).unwrap();
        assert_eq!(sequence_value(&instrs), n, "value for {}", n);
        assert_eq!(sequence_cost(&instrs), cost, "cost for {}", n);
    }
    engine.cache.check().unwrap();
}

#[test]
fn search_never_loses_to_the_seeder() {
    for n in 2..=200i64 {
        let mut seeder = MultSearch::new(DEFAULT_PROFILE);
        let (binary_cost, _) = seeder.binary_sequence(n).unwrap();

        let mut searcher = MultSearch::new(DEFAULT_PROFILE);
        let (cost, _) = searcher.find_sequence(n).unwrap();
        assert!(
            cost <= binary_cost,
            "{}: search {} vs binary {}",
            n,
            cost,
            binary_cost
        );
    }
}

#[test]
fn finished_entries_are_exact() {
    let mut engine = MultSearch::new(DEFAULT_PROFILE);
    for n in [7, 51, 340, 343, -51] {
        engine.find_sequence(n).unwrap();
    }
    for (num, entry) in engine.cache.iter() {
        if entry.finished {
            assert_eq!(entry.lower, entry.upper, "bounds for {}", num);
            assert_eq!(
                sequence_cost(&entry.instrs),
                entry.upper,
                "cost of sequence for {}",
                num
            );
            assert_eq!(sequence_value(&entry.instrs), *num, "value for {}", num);
        }
    }
}

#[test]
fn sign_reflection_under_default_profile() {
    let mut engine = MultSearch::new(DEFAULT_PROFILE);
    let negate_cost = DEFAULT_PROFILE.costs.negate;
    for n in 2..=64i64 {
        let (cost, _) = engine.find_sequence(n).unwrap();
        let (ncost, _) = engine.find_sequence(-n).unwrap();
        assert!(
            (ncost - cost).abs() <= negate_cost,
            "costs for +/-{}: {} vs {}",
            n,
            cost,
            ncost
        );
    }
}

#[test]
fn sequence_text_round_trips() {
    let mut engine = MultSearch::new(DEFAULT_PROFILE);
    for n in [7, 51, 85, 340, 343, -7, -51] {
        let (_, instrs) = engine.find_sequence(n).unwrap();
        let text = sequence_to_string(&instrs);
        let parsed = parse_sequence(&text, &DEFAULT_PROFILE).unwrap();
        assert_eq!(parsed, instrs, "round-trip of {}", text);
    }
}

#[test]
fn add_only_profile_has_no_subtracts() {
    let mut engine = MultSearch::new(CHAINED_ADDS);
    for n in 2..=64i64 {
        let (cost, instrs) = engine.find_sequence(n).unwrap();
        assert!(cost.is_finite(), "cost for {}", n);
        assert_eq!(sequence_value(&instrs), n);
        let text = sequence_to_string(&instrs);
        assert!(
            !text.contains('-'),
            "add-only sequence for {} contains a subtract: {}",
            n,
            text
        );
    }
}
