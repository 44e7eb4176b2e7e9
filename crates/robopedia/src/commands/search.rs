use crate::commands::CmdResult;
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;

/// Case-insensitive substring search over the text fields of each record, in view
/// order. A blank term lists everything.
pub fn run<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    term: &str,
) -> CmdResult<T> {
    let needle = term.trim().to_lowercase();
    let listed = store
        .all(backend)
        .into_iter()
        .filter(|record| needle.is_empty() || record.matches(&needle))
        .collect();
    CmdResult::default().with_listed(listed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewsArticle, NewsDraft, Robot, RobotDraft};
    use crate::store::mem_backend::MemBackend;

    fn robots() -> EntityStore<Robot> {
        EntityStore::new(vec![
            Robot::from_draft(
                "robot-1".into(),
                "spot".into(),
                RobotDraft {
                    manufacturer: Some("Boston Dynamics".into()),
                    tags: Some(vec!["Quadruped".into()]),
                    ..RobotDraft::named("Spot")
                },
            ),
            Robot::from_draft(
                "robot-2".into(),
                "pepper".into(),
                RobotDraft {
                    description: Some("Greets customers".into()),
                    ..RobotDraft::named("Pepper")
                },
            ),
        ])
    }

    fn names(result: CmdResult<Robot>) -> Vec<String> {
        result.listed.into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn matches_any_field_ignoring_case() {
        let backend = MemBackend::new();
        let mut store = robots();
        assert_eq!(names(run(&mut store, &backend, "BOSTON")), vec!["Spot"]);
        assert_eq!(names(run(&mut store, &backend, "quadru")), vec!["Spot"]);
        assert_eq!(names(run(&mut store, &backend, "customers")), vec!["Pepper"]);
    }

    #[test]
    fn same_results_for_any_casing() {
        let backend = MemBackend::new();
        let mut store = robots();
        let lower = names(run(&mut store, &backend, "pep"));
        let upper = names(run(&mut store, &backend, "PEP"));
        assert_eq!(lower, upper);
    }

    #[test]
    fn blank_term_lists_everything() {
        let backend = MemBackend::new();
        let mut store = robots();
        assert_eq!(run(&mut store, &backend, "  ").listed.len(), 2);
        assert!(run(&mut store, &backend, "zzz").listed.is_empty());
    }

    #[test]
    fn news_searches_summary_and_author() {
        let backend = MemBackend::new();
        let mut store = EntityStore::new(vec![NewsArticle::from_draft(
            "news-1".into(),
            "launch".into(),
            NewsDraft {
                summary: Some("A new humanoid".into()),
                author: Some("Grace".into()),
                ..NewsDraft::titled("Launch")
            },
        )]);
        assert_eq!(run(&mut store, &backend, "HUMANOID").listed.len(), 1);
        assert_eq!(run(&mut store, &backend, "grace").listed.len(), 1);
    }
}
