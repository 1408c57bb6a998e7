
use std::sync::Arc;

use proptest::prelude::*;
use rulegraph::{Edit, PreviewLine, Response, Rule};
use strategies::{
    arb_action, arb_node, arb_rule, arb_rule_and_path, node_paths, sorted_names,
};

fn without_one(mut names: Vec<String>, name: &str) -> Vec<String> {
    if let Some(pos) = names.iter().position(|n| n == name) {
        names.remove(pos);
    }
    names
}

// ---------------------------------------------------------------------------
// Invariant 1: Persistence
//
// Applying an edit never changes the rule it was applied to.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn edits_leave_input_untouched((rule, path) in arb_rule_and_path()) {
        let before = rule.clone();
        for edit in [
            Edit::Remove,
            Edit::MoveDown,
            Edit::WrapInCondition,
            Edit::WrapInActOn,
            Edit::WrapInRepeat,
            Edit::WrapInInfiniteRepeat,
        ] {
            let _ = rule.apply(&path, edit);
            prop_assert_eq!(&rule, &before);
        }
    }

    #[test]
    fn trigger_survives_every_edit((rule, path) in arb_rule_and_path()) {
        let edited = rule.apply(&path, Edit::WrapInRepeat).unwrap();
        prop_assert_eq!(&edited.trigger, &rule.trigger);
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Remove deletes exactly one node
//
// Flattening promotes nested lists, so every other node survives.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn remove_deletes_only_the_target((rule, path) in arb_rule_and_path()) {
        let target = rule.get(&path).unwrap().name().to_owned();
        let edited = rule.apply(&path, Edit::Remove).unwrap();
        prop_assert_eq!(sorted_names(&edited), without_one(sorted_names(&rule), &target));
    }

    #[test]
    fn insert_adds_exactly_one_node(
        (rule, path) in arb_rule_and_path(),
        node in arb_action(),
    ) {
        let edited = rule.apply(&path, Edit::InsertBefore(node.clone())).unwrap();
        prop_assert_eq!(edited.node_count(), rule.node_count() + 1);
        prop_assert_eq!(edited.get(&path).unwrap().name(), node.name());
        let pushed_back = path.clone().next();
        prop_assert!(Arc::ptr_eq(
            edited.get(&pushed_back).unwrap(),
            rule.get(&path).unwrap()
        ));
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Reversibility
//
// Moving down twice swaps back; wrapping then removing the wrapper restores
// the original list.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn move_down_twice_is_identity((rule, path) in arb_rule_and_path()) {
        let once = rule.apply(&path, Edit::MoveDown).unwrap();
        let twice = once.apply(&path, Edit::MoveDown).unwrap();
        prop_assert_eq!(twice, rule);
    }

    #[test]
    fn wrap_then_remove_is_identity((rule, path) in arb_rule_and_path()) {
        for edit in [
            Edit::WrapInCondition,
            Edit::WrapInActOn,
            Edit::WrapInRepeat,
            Edit::WrapInInfiniteRepeat,
        ] {
            let wrapped = rule.apply(&path, edit).unwrap();
            prop_assert_eq!(wrapped.node_count(), rule.node_count() + 1);
            let unwrapped = wrapped.apply(&path, Edit::Remove).unwrap();
            prop_assert_eq!(&unwrapped, &rule);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Structural sharing
//
// Nodes outside the edited position are the same allocations as before.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn siblings_after_target_are_shared((rule, path) in arb_rule_and_path()) {
        let target = rule.get(&path).unwrap();
        if let Some(after) = target.next().and_then(|n| n.next()) {
            let edited = rule.apply(&path, Edit::MoveDown).unwrap();
            let shared = edited.get(&path.clone().next().next()).unwrap();
            prop_assert!(Arc::ptr_eq(shared, after));
        }
    }

    #[test]
    fn insert_at_front_shares_old_list(rule in arb_rule(), node in arb_action()) {
        let edited = rule
            .apply(&rulegraph::ResponsePath::root(), Edit::InsertBefore(node))
            .unwrap();
        if let Some(head) = &rule.response {
            prop_assert!(Arc::ptr_eq(edited.response.as_ref().unwrap().next().unwrap(), head));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Interchange round trips
//
// JSON, rule notation, and the flattened preview agree with the tree.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn json_round_trip(rule in arb_rule()) {
        let decoded = Rule::from_json_str(&rule.to_json_string()).unwrap();
        prop_assert_eq!(decoded, rule);
    }

    #[test]
    fn notation_round_trip(rule in arb_rule()) {
        let text = rule.to_string();
        let parsed = Rule::from_dsl(&text).unwrap();
        prop_assert_eq!(parsed, rule, "notation was:\n{}", text);
    }

    #[test]
    fn response_round_trip(node in arb_node()) {
        let decoded = Response::from_json(&node.to_json()).unwrap();
        prop_assert_eq!(&*decoded, &node);
    }

    #[test]
    fn preview_has_one_row_per_node(rule in arb_rule()) {
        let rows = rule.preview_rows();
        let responses = rows
            .iter()
            .filter(|row| matches!(row.line, PreviewLine::Response { .. }))
            .count();
        prop_assert_eq!(responses, rule.node_count());
        prop_assert_eq!(node_paths(&rule).len(), rule.node_count());

        let mut elses = 0;
        rule.visit(|node, _| elses += usize::from(node.else_branch().is_some()));
        prop_assert_eq!(rows.len() - responses, elses);
    }
}
