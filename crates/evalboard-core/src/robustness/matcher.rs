//! Item matching across a run set.

use std::collections::BTreeSet;

use crate::domain::{ItemIdentity, Run};

/// Union of item identities over every run in `runs`.
///
/// An item reported by only some runs is still a candidate; it is aggregated
/// from the runs that report it. Ordering is deterministic.
pub fn item_identities(runs: &[Run]) -> BTreeSet<&ItemIdentity> {
    runs.iter()
        .flat_map(|run| run.items.iter().map(|row| &row.identity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemRow, RunGroupKey};
    use chrono::Utc;

    fn run(id: &str, items: &[&str]) -> Run {
        let key = RunGroupKey::new("t", "d", "m");
        items.iter().fold(
            Run::new(id, Utc::now(), &key, vec!["acc".to_string()]),
            |run, item| run.with_item(ItemRow::by_id(*item, vec![Some(1.0)])),
        )
    }

    #[test]
    fn union_not_intersection() {
        let runs = vec![run("r1", &["a", "b"]), run("r2", &["b", "c"])];
        let ids: Vec<String> = item_identities(&runs)
            .into_iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_run_set_has_no_items() {
        assert!(item_identities(&[]).is_empty());
    }

    #[test]
    fn id_and_index_identities_stay_distinct() {
        let key = RunGroupKey::new("t", "d", "m");
        let runs = vec![
            run("r1", &["0"]),
            Run::new("r2", Utc::now(), &key, vec!["acc".to_string()])
                .with_item(ItemRow::by_index(0, vec![Some(1.0)])),
        ];
        assert_eq!(item_identities(&runs).len(), 2);
    }
}
