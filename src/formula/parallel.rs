use crate::formula::expression::ArcSubExpression;
use crate::net::structure::Transition;

/// Whether some parallel set holds at least `n` transitions satisfying
/// `condition`. Sets smaller than `n` are skipped without evaluation.
pub fn n_parallel_transitions_with_condition<C>(
    condition: &C,
    n: usize,
    parallel_sets: &[Vec<Transition>],
) -> bool
where
    C: ArcSubExpression + ?Sized,
{
    for set in parallel_sets.iter().filter(|set| set.len() >= n) {
        let mut satisfied = 0;
        for transition in set {
            log::debug!(
                "evaluating transition {} ({})",
                transition.name,
                transition.context.label()
            );
            if condition.evaluate(transition) {
                satisfied += 1;
            }
        }
        if satisfied >= n {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::expression::ContextCondition;
    use crate::net::ids::NodeId;
    use crate::net::structure::ContextObject;

    fn labelled(id: u32, read: &str) -> Transition {
        Transition::with_context(NodeId::new(id), read, ContextObject::reading(read))
    }

    fn reads_a_or_b() -> ContextCondition {
        ContextCondition::Reads("a".into()).or(ContextCondition::Reads("b".into()))
    }

    #[test]
    fn threshold_two_is_met_threshold_three_is_not() {
        let sets = vec![vec![labelled(1, "a"), labelled(2, "b"), labelled(3, "c")]];

        assert!(n_parallel_transitions_with_condition(&reads_a_or_b(), 2, &sets));
        assert!(!n_parallel_transitions_with_condition(&reads_a_or_b(), 3, &sets));
    }

    #[test]
    fn undersized_sets_are_not_evaluated() {
        let sets = vec![vec![labelled(1, "a")]];
        let calls = std::cell::Cell::new(0);
        let counting = |_: &Transition| {
            calls.set(calls.get() + 1);
            true
        };

        assert!(!n_parallel_transitions_with_condition(&counting, 2, &sets));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn any_qualifying_set_suffices() {
        let sets = vec![
            vec![labelled(1, "a"), labelled(2, "c")],
            vec![labelled(3, "b"), labelled(4, "a")],
        ];
        assert!(n_parallel_transitions_with_condition(&reads_a_or_b(), 2, &sets));
    }

    #[test]
    fn zero_threshold_needs_some_set() {
        assert!(!n_parallel_transitions_with_condition(&ContextCondition::False, 0, &[]));
        assert!(n_parallel_transitions_with_condition(
            &ContextCondition::False,
            0,
            &[Vec::new()]
        ));
    }
}
