//! # Dependency Order — Per-Entity Init Order
//!
//! Components declare the types they must be initialized after. For one
//! entity's component list this module produces an init order in which every
//! component comes after the components it depends on.
//!
//! ```text
//! declared:  [Transform, KeyInput, OrbitController]
//! edges:     OrbitController ──► Transform
//!            OrbitController ──► KeyInput
//! order:     [Transform, KeyInput, OrbitController]
//! ```
//!
//! The sort is stable: among components that are ready at the same time, the
//! one declared first goes first. Unrelated components therefore keep their
//! declaration order, and the same entity always sorts the same way.
//!
//! A dependency on a type that no component on the entity satisfies is
//! ignored. A cycle is reported with the positions forming it.

/// Sort positions `0..len` so that every position comes after the positions
/// it depends on.
///
/// `depends_on(a, b)` is `true` when `a` must be initialized after `b`.
/// Returns the cycle (first position repeated at the end) on failure.
pub(crate) fn dependency_order(
    len: usize,
    depends_on: impl Fn(usize, usize) -> bool,
) -> Result<Vec<usize>, Vec<usize>> {
    // deps[a] = positions that must come before a.
    let deps: Vec<Vec<usize>> = (0..len)
        .map(|a| (0..len).filter(|&b| a != b && depends_on(a, b)).collect())
        .collect();

    let mut remaining: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut emitted = vec![false; len];
    let mut order = Vec::with_capacity(len);

    while order.len() < len {
        let Some(next) = (0..len).find(|&i| !emitted[i] && remaining[i] == 0) else {
            return Err(find_cycle(&deps, &emitted));
        };
        emitted[next] = true;
        order.push(next);
        for (a, before) in deps.iter().enumerate() {
            if !emitted[a] && before.contains(&next) {
                remaining[a] -= 1;
            }
        }
    }

    Ok(order)
}

/// Walk unfinished dependencies from the first stuck position until one
/// repeats. Every stuck position has at least one stuck dependency, so the
/// walk always closes a loop.
fn find_cycle(deps: &[Vec<usize>], emitted: &[bool]) -> Vec<usize> {
    let Some(start) = (0..deps.len()).find(|&i| !emitted[i]) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = deps[current].iter().find(|&&b| !emitted[b]) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_registry;

    /// Sort type names the way the builder does: `a` after `b` when one of
    /// `a`'s declared dependencies is a kind of `b`.
    fn sort(types: &[&str]) -> Result<Vec<usize>, Vec<usize>> {
        let registry = fixture_registry();
        dependency_order(types.len(), |a, b| {
            registry
                .dependencies(types[a])
                .iter()
                .any(|dep| registry.is_kind_of(types[b], dep))
        })
    }

    #[test]
    fn camera_example() {
        let order = sort(&["Transform", "KeyInput", "OrbitController"]).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn dependent_declared_first_moves_after_dependencies() {
        let order = sort(&["OrbitController", "KeyInput", "Transform"]).unwrap();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn unrelated_components_keep_declaration_order() {
        let order = sort(&["Base", "Recorder", "Transform", "Derived"]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn stable_across_runs() {
        let types = ["OrbitController", "Base", "KeyInput", "Derived", "Transform"];
        let first = sort(&types).unwrap();
        for _ in 0..10 {
            assert_eq!(sort(&types).unwrap(), first);
        }
        assert_eq!(first, vec![1, 2, 3, 4, 0]);
    }

    #[test]
    fn missing_dependency_is_ignored() {
        let order = sort(&["OrbitController"]).unwrap();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn dependency_satisfied_by_derived_type() {
        // NeedsBase depends on Base; Derived is a kind of Base.
        let order = sort(&["NeedsBase", "Derived"]).unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn mutual_dependency_is_a_cycle() {
        let cycle = sort(&["Transform", "CycleA", "CycleB"]).unwrap_err();
        assert_eq!(cycle, vec![1, 2, 1]);
    }

    #[test]
    fn two_self_dependent_components_form_a_cycle() {
        let single = sort(&["SelfDependent"]);
        assert_eq!(single, Ok(vec![0]));

        let pair = sort(&["SelfDependent", "SelfDependent"]).unwrap_err();
        assert_eq!(pair, vec![0, 1, 0]);
    }
}
