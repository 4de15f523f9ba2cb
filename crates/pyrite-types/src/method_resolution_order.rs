//! Method-resolution-order linearization.
//!
//! C3: the linearization of a class is the class followed by the merge of its
//! parents' linearizations and the parent list. The merge repeatedly takes the
//! first "good head" (a head appearing in no other list's tail); failing to
//! find one means the declared bases are inconsistent.

use crate::class_hierarchy::{ClassIndex, HierarchyError, Target};
use rustc_hash::FxHashSet;

/// Linearize `index` under `get_successors`. The result starts with `index`
/// itself and respects declared parent order.
pub fn linearize(
    get_successors: &dyn Fn(ClassIndex) -> Option<Vec<Target>>,
    index: ClassIndex,
) -> Result<Vec<ClassIndex>, HierarchyError> {
    let mut visiting = FxHashSet::default();
    linearize_inner(get_successors, index, &mut visiting)
}

fn linearize_inner(
    get_successors: &dyn Fn(ClassIndex) -> Option<Vec<Target>>,
    index: ClassIndex,
    visiting: &mut FxHashSet<ClassIndex>,
) -> Result<Vec<ClassIndex>, HierarchyError> {
    if !visiting.insert(index) {
        return Err(HierarchyError::Cyclic);
    }
    let parents: Vec<ClassIndex> = get_successors(index)
        .ok_or(HierarchyError::Incomplete)?
        .iter()
        .map(|target| target.target)
        .collect();

    let mut sequences: Vec<Vec<ClassIndex>> = Vec::with_capacity(parents.len() + 1);
    for parent in &parents {
        sequences.push(linearize_inner(get_successors, *parent, visiting)?);
    }
    if !parents.is_empty() {
        sequences.push(parents);
    }

    let mut linearization = vec![index];
    linearization.extend(merge(sequences, index)?);
    visiting.remove(&index);
    Ok(linearization)
}

fn merge(
    mut sequences: Vec<Vec<ClassIndex>>,
    class: ClassIndex,
) -> Result<Vec<ClassIndex>, HierarchyError> {
    let mut merged = Vec::new();
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return Ok(merged);
        }
        // A head is good iff it appears in no other sequence's tail.
        // Tie-break by trying heads in declared parent order.
        let good = sequences
            .iter()
            .map(|sequence| sequence[0])
            .find(|head| {
                sequences
                    .iter()
                    .all(|sequence| !sequence[1..].contains(head))
            });
        match good {
            Some(head) => {
                merged.push(head);
                for sequence in &mut sequences {
                    sequence.retain(|candidate| *candidate != head);
                }
            }
            None => {
                return Err(HierarchyError::InconsistentMethodResolutionOrder(class));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_hierarchy::{ClassIndex, Target};
    use crate::ordered_types::OrderedTypes;
    use rustc_hash::FxHashMap;

    fn edges(pairs: &[(u32, &[u32])]) -> FxHashMap<ClassIndex, Vec<Target>> {
        pairs
            .iter()
            .map(|(child, parents)| {
                (
                    ClassIndex(*child),
                    parents
                        .iter()
                        .map(|parent| Target {
                            target: ClassIndex(*parent),
                            parameters: OrderedTypes::empty(),
                        })
                        .collect(),
                )
            })
            .collect()
    }

    fn run(map: &FxHashMap<ClassIndex, Vec<Target>>, index: u32) -> Result<Vec<u32>, HierarchyError> {
        linearize(&|index| map.get(&index).cloned(), ClassIndex(index))
            .map(|linearized| linearized.into_iter().map(|index| index.0).collect())
    }

    #[test]
    fn diamond_linearizes() {
        // 3 -> (1, 2), 1 -> 0, 2 -> 0
        let map = edges(&[(0, &[]), (1, &[0]), (2, &[0]), (3, &[1, 2])]);
        assert_eq!(run(&map, 3).unwrap(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn parent_order_is_respected() {
        let map = edges(&[(0, &[]), (1, &[0]), (2, &[0]), (3, &[2, 1])]);
        assert_eq!(run(&map, 3).unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn inconsistent_order_is_reported() {
        // A(X, Y), B(Y, X), C(A, B): X and Y cannot be ordered.
        let map = edges(&[
            (0, &[]),  // X
            (1, &[]),  // Y
            (2, &[0, 1]), // A(X, Y)
            (3, &[1, 0]), // B(Y, X)
            (4, &[2, 3]), // C(A, B)
        ]);
        assert!(matches!(
            run(&map, 4),
            Err(HierarchyError::InconsistentMethodResolutionOrder(_))
        ));
    }

    #[test]
    fn cycle_is_reported() {
        let map = edges(&[(0, &[1]), (1, &[0])]);
        assert!(matches!(run(&map, 0), Err(HierarchyError::Cyclic)));
    }

    #[test]
    fn missing_edges_are_incomplete() {
        let map = edges(&[(0, &[7])]);
        assert!(matches!(run(&map, 0), Err(HierarchyError::Incomplete)));
    }
}
