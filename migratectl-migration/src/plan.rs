use migratectl_backend::{AppliedLog, MigrationId};

use crate::{
    error::{IntegrityError, MigrationError},
    target::{Direction, Target},
};

/// Checks that `applied` is a position-by-position prefix of `available`.
pub fn check_integrity(
    available: &[MigrationId],
    applied: &[MigrationId],
) -> Result<(), IntegrityError> {
    match applied
        .iter()
        .enumerate()
        .find(|&(ix, id)| available.get(ix) != Some(id))
    {
        None => Ok(()),
        Some((index, id)) => Err(IntegrityError {
            index,
            applied: id.clone(),
            available: available.get(index).cloned(),
        }),
    }
}

/// Ordered migrations selected for one run, in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub direction: Direction,
    pub steps: Vec<MigrationId>,
}

impl Plan {
    /// Computes the steps for `direction` and `target`.
    ///
    /// The caller is expected to have run [`check_integrity`] first.
    pub fn build(
        available: &[MigrationId],
        applied: &[MigrationId],
        direction: Direction,
        target: Option<&Target>,
    ) -> Result<Self, MigrationError> {
        let pool: Vec<&MigrationId> = match direction {
            Direction::Up => available.iter().skip(applied.len()).collect(),
            Direction::Down => applied.iter().rev().collect(),
        };

        let take = match target {
            None => match direction {
                Direction::Up => pool.len(),
                Direction::Down => 1,
            },
            Some(Target::Count(count)) => count.get(),
            Some(Target::Id(id)) => {
                pool.iter()
                    .position(|candidate| *candidate == id)
                    .ok_or_else(|| MigrationError::TargetNotFound(id.to_string()))?
                    + 1
            }
        };

        Ok(Self {
            direction,
            steps: pool.into_iter().take(take).cloned().collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Applies this plan to `applied`, producing the log to persist.
    pub fn commit(&self, mut applied: AppliedLog) -> AppliedLog {
        match self.direction {
            Direction::Up => applied.extend(self.steps.iter().cloned()),
            Direction::Down => applied.truncate_tail(self.steps.len()),
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::num::NonZeroUsize;

    fn ids(names: &[&str]) -> Vec<MigrationId> {
        names.iter().map(|&n| MigrationId::from(n)).collect()
    }

    fn all() -> Vec<MigrationId> {
        ids(&["m1", "m2", "m3", "m4", "m5"])
    }

    fn count(n: usize) -> Target {
        Target::Count(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn up_without_target_runs_everything_new() {
        let applied = ids(&["m1", "m2"]);
        let plan = Plan::build(&all(), &applied, Direction::Up, None).unwrap();
        assert_eq!(plan.steps, ids(&["m3", "m4", "m5"]));
        assert_eq!(&*plan.commit(applied.into()), all().as_slice());
    }

    #[test]
    fn up_with_count() {
        let applied = ids(&["m1", "m2"]);
        let plan = Plan::build(&all(), &applied, Direction::Up, Some(&count(1))).unwrap();
        assert_eq!(plan.steps, ids(&["m3"]));
        assert_eq!(
            &*plan.commit(applied.into()),
            ids(&["m1", "m2", "m3"]).as_slice()
        );
    }

    #[test]
    fn up_count_is_clamped_to_pool() {
        let applied = ids(&["m1", "m2", "m3"]);
        let plan = Plan::build(&all(), &applied, Direction::Up, Some(&count(10))).unwrap();
        assert_eq!(plan.steps, ids(&["m4", "m5"]));
    }

    #[test]
    fn up_to_id_is_inclusive() {
        let target = Target::Id("m4".into());
        let plan = Plan::build(&all(), &ids(&["m1"]), Direction::Up, Some(&target)).unwrap();
        assert_eq!(plan.steps, ids(&["m2", "m3", "m4"]));
    }

    #[test]
    fn up_to_applied_or_unknown_id_fails() {
        let applied = ids(&["m1", "m2"]);
        for missing in ["m2", "m9"] {
            let target = Target::Id(missing.into());
            let err = Plan::build(&all(), &applied, Direction::Up, Some(&target)).unwrap_err();
            assert!(matches!(err, MigrationError::TargetNotFound(id) if id == missing));
        }
    }

    #[test]
    fn down_without_target_reverts_one() {
        let applied = ids(&["m1", "m2", "m3"]);
        let plan = Plan::build(&all(), &applied, Direction::Down, None).unwrap();
        assert_eq!(plan.steps, ids(&["m3"]));
        assert_eq!(&*plan.commit(applied.into()), ids(&["m1", "m2"]).as_slice());
    }

    #[test]
    fn down_to_id_reverts_in_reverse_order() {
        let applied = ids(&["m1", "m2", "m3"]);
        let target = Target::Id("m1".into());
        let plan = Plan::build(&all(), &applied, Direction::Down, Some(&target)).unwrap();
        assert_eq!(plan.steps, ids(&["m3", "m2", "m1"]));
        assert!(plan.commit(applied.into()).is_empty());
    }

    #[test]
    fn down_with_count_and_unknown_id() {
        let applied = ids(&["m1", "m2", "m3"]);
        let plan = Plan::build(&all(), &applied, Direction::Down, Some(&count(2))).unwrap();
        assert_eq!(plan.steps, ids(&["m3", "m2"]));

        let target = Target::Id("m4".into());
        let err = Plan::build(&all(), &applied, Direction::Down, Some(&target)).unwrap_err();
        assert!(matches!(err, MigrationError::TargetNotFound(_)));
    }

    #[test]
    fn empty_pools_yield_empty_plans() {
        assert!(Plan::build(&all(), &all(), Direction::Up, None).unwrap().is_empty());
        assert!(Plan::build(&all(), &[], Direction::Down, None).unwrap().is_empty());
        assert!(
            Plan::build(&[], &[], Direction::Down, Some(&count(3)))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn integrity_reports_first_divergence() {
        let err = check_integrity(&all(), &ids(&["m1", "mX", "mY"])).unwrap_err();
        assert_eq!(
            err,
            IntegrityError {
                index: 1,
                applied: "mX".into(),
                available: Some("m2".into()),
            }
        );
    }

    #[test]
    fn integrity_rejects_longer_log() {
        let err = check_integrity(&ids(&["m1"]), &ids(&["m1", "m2"])).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.available, None);
    }

    proptest! {
        #[test]
        fn prefixes_pass_integrity(len in 0usize..12, cut in 0usize..12) {
            let available: Vec<MigrationId> =
                (0..len).map(|i| format!("{:010}_m.sh", i).into()).collect();
            let cut = cut.min(len);
            prop_assert!(check_integrity(&available, &available[..cut]).is_ok());
        }

        #[test]
        fn divergence_is_found_at_first_changed_index(len in 1usize..12, at in 0usize..12) {
            let available: Vec<MigrationId> =
                (0..len).map(|i| format!("{:010}_m.sh", i).into()).collect();
            let at = at % len;
            let mut applied = available.clone();
            applied[at] = "renamed.sh".into();
            let err = check_integrity(&available, &applied).unwrap_err();
            prop_assert_eq!(err.index, at);
            prop_assert_eq!(err.applied.as_str(), "renamed.sh");
        }

        #[test]
        fn up_then_down_restores_log(len in 0usize..10, applied in 0usize..10, n in 1usize..10) {
            let available: Vec<MigrationId> =
                (0..len).map(|i| format!("{:010}_m.sh", i).into()).collect();
            let log: AppliedLog = available[..applied.min(len)].to_vec().into();
            let up = Plan::build(&available, &log, Direction::Up, Some(&count(n))).unwrap();
            let after_up = up.commit(log.clone());
            prop_assert!(check_integrity(&available, &after_up).is_ok());

            let down = Plan::build(&available, &after_up, Direction::Down, Some(&count(up.len().max(1)))).unwrap();
            let expected = if up.is_empty() { log.len().saturating_sub(1) } else { log.len() };
            prop_assert_eq!(down.commit(after_up).len(), expected);
        }
    }
}
