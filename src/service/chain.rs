//! Pure planning for comment chain links.
//!
//! Comments form disjoint doubly-linked chains through `previous_id` /
//! `next_id`. Both directions are stored as independently mutable columns,
//! so every link change must write both sides. The planner works over plain
//! ids (never row references), which keeps the cycle walk a bounded lookup
//! over an id-keyed map.

use crate::error::AppError;
use crate::model::Comment;
use std::collections::{HashMap, HashSet};

/// One pointer write against a comment row. The plan never emits a clear and
/// a set for the same column of the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkWrite {
    ClearNext(i64),
    ClearPrevious(i64),
    SetNext { id: i64, next: i64 },
    SetPrevious { id: i64, previous: i64 },
}

/// The reciprocal write set for moving one comment to a new
/// (previous, next) pair, plus the next-pointer state those writes will
/// leave behind (layered over stored rows by the cycle walk).
#[derive(Debug)]
pub struct RelinkPlan {
    pub writes: Vec<LinkWrite>,
    pub new_previous: Option<i64>,
    pub new_next: Option<i64>,
    pub next_overrides: HashMap<i64, Option<i64>>,
}

impl RelinkPlan {
    /// `new_previous` / `new_next` are the already-loaded neighbor rows;
    /// `None` detaches that side. Rejects self-references before anything
    /// else; cycle detection is the caller's walk over `next_overrides`.
    pub fn build(
        target: &Comment,
        new_previous: Option<&Comment>,
        new_next: Option<&Comment>,
    ) -> Result<Self, AppError> {
        if new_previous.map(|p| p.id) == Some(target.id)
            || new_next.map(|n| n.id) == Some(target.id)
        {
            return Err(AppError::InvalidChain(format!(
                "comment {} cannot link to itself",
                target.id
            )));
        }

        let new_previous_id = new_previous.map(|p| p.id);
        let new_next_id = new_next.map(|n| n.id);
        let mut writes = Vec::new();
        let mut next_overrides = HashMap::new();

        // Detach stale neighbors of the target.
        if let Some(old_prev) = target.previous_id {
            if Some(old_prev) != new_previous_id {
                writes.push(LinkWrite::ClearNext(old_prev));
                next_overrides.insert(old_prev, None);
            }
        }
        if let Some(old_next) = target.next_id {
            if Some(old_next) != new_next_id {
                writes.push(LinkWrite::ClearPrevious(old_next));
            }
        }

        // Detach whatever the new neighbors currently point at, then write
        // both sides of each new link. A displaced row that is itself the
        // other new neighbor keeps its pointer: the set write below covers it
        // (inserting between an already-linked pair must not null the pair).
        if let Some(p) = new_previous {
            if let Some(displaced) = p.next_id {
                if displaced != target.id && Some(displaced) != new_next_id {
                    writes.push(LinkWrite::ClearPrevious(displaced));
                }
            }
            writes.push(LinkWrite::SetNext {
                id: p.id,
                next: target.id,
            });
            next_overrides.insert(p.id, Some(target.id));
        }
        if let Some(n) = new_next {
            if let Some(displaced) = n.previous_id {
                if displaced != target.id && Some(displaced) != new_previous_id {
                    writes.push(LinkWrite::ClearNext(displaced));
                    next_overrides.insert(displaced, None);
                }
            }
            writes.push(LinkWrite::SetPrevious {
                id: n.id,
                previous: target.id,
            });
        }

        next_overrides.insert(target.id, new_next_id);

        Ok(RelinkPlan {
            writes,
            new_previous: new_previous_id,
            new_next: new_next_id,
            next_overrides,
        })
    }
}

/// Visited-set bound for the next-pointer walk. Any revisit while walking
/// from the modified node means the proposed links close a loop.
pub struct CycleGuard {
    seen: HashSet<i64>,
}

impl CycleGuard {
    pub fn new(origin: i64) -> Self {
        let mut seen = HashSet::new();
        seen.insert(origin);
        CycleGuard { seen }
    }

    pub fn check(&mut self, id: i64) -> Result<(), AppError> {
        if !self.seen.insert(id) {
            return Err(AppError::InvalidChain(format!(
                "linking would create a cycle through comment {}",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, previous_id: Option<i64>, next_id: Option<i64>) -> Comment {
        Comment {
            id,
            content: format!("comment {}", id),
            owner_id: 1,
            previous_id,
            next_id,
            deleted: false,
        }
    }

    /// Walk next pointers the way the service does: plan overrides first,
    /// stored rows otherwise.
    fn walk(
        plan: &RelinkPlan,
        stored: &HashMap<i64, Option<i64>>,
        origin: i64,
    ) -> Result<(), AppError> {
        let mut guard = CycleGuard::new(origin);
        let mut cur = plan.new_next;
        while let Some(id) = cur {
            guard.check(id)?;
            cur = match plan.next_overrides.get(&id) {
                Some(v) => *v,
                None => stored.get(&id).copied().flatten(),
            };
        }
        Ok(())
    }

    #[test]
    fn self_reference_is_rejected() {
        let c = comment(1, None, None);
        let err = RelinkPlan::build(&c, None, Some(&c)).unwrap_err();
        assert!(matches!(err, AppError::InvalidChain(_)));
        let err = RelinkPlan::build(&c, Some(&c), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidChain(_)));
    }

    #[test]
    fn linking_into_a_chain_writes_both_sides() {
        // B joins between A and C: A -> B -> C.
        let b = comment(2, None, None);
        let a = comment(1, None, Some(3));
        let c = comment(3, Some(1), None);
        let plan = RelinkPlan::build(&b, Some(&a), Some(&c)).unwrap();
        // Only the two set writes: A's old next (C) and C's old previous (A)
        // are each the other new neighbor, so no displaced clears fire.
        assert_eq!(
            plan.writes,
            vec![
                LinkWrite::SetNext { id: 1, next: 2 },
                LinkWrite::SetPrevious { id: 3, previous: 2 },
            ]
        );
        assert_eq!(plan.new_previous, Some(1));
        assert_eq!(plan.new_next, Some(3));
        assert_eq!(plan.next_overrides.get(&1), Some(&Some(2)));
        assert_eq!(plan.next_overrides.get(&2), Some(&Some(3)));
    }

    #[test]
    fn detaching_clears_the_neighbors() {
        // A -> B -> C, then B detaches both sides.
        let b = comment(2, Some(1), Some(3));
        let plan = RelinkPlan::build(&b, None, None).unwrap();
        assert_eq!(
            plan.writes,
            vec![LinkWrite::ClearNext(1), LinkWrite::ClearPrevious(3)]
        );
        assert_eq!(plan.next_overrides.get(&2), Some(&None));
    }

    #[test]
    fn two_node_loop_is_a_cycle() {
        // A.next = B while B.next = A.
        let a = comment(1, None, None);
        let b = comment(2, None, Some(1));
        let stored = HashMap::from([(2, Some(1))]);
        let plan = RelinkPlan::build(&a, None, Some(&b)).unwrap();
        assert!(matches!(
            walk(&plan, &stored, 1),
            Err(AppError::InvalidChain(_))
        ));
    }

    #[test]
    fn closing_a_three_node_chain_is_a_cycle() {
        // A -> B -> C, then C.next = A.
        let c = comment(3, Some(2), None);
        let b = comment(2, Some(1), Some(3));
        let a = comment(1, None, Some(2));
        let stored = HashMap::from([(1, Some(2)), (2, Some(3))]);
        let plan = RelinkPlan::build(&c, Some(&b), Some(&a)).unwrap();
        assert!(matches!(
            walk(&plan, &stored, 3),
            Err(AppError::InvalidChain(_))
        ));
    }

    #[test]
    fn straight_chain_walk_terminates() {
        // B appends after a lone A; no loop.
        let b = comment(2, None, None);
        let a = comment(1, None, None);
        let stored = HashMap::from([(1, None)]);
        let plan = RelinkPlan::build(&b, Some(&a), None).unwrap();
        assert!(walk(&plan, &stored, 2).is_ok());
    }
}
