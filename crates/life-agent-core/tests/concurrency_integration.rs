//! Concurrent deploys on one database file from separate connections.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{TimeZone, Utc};
use life_agent_core::intervention::TriggerSnapshot;
use life_agent_core::{Database, DeployOutcome, Domain, LifecycleManager, RequestContext};

#[test]
fn test_parallel_deploys_open_one_intervention() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("life_agent.db");
    // Create the schema before the workers race.
    drop(Database::open_at(&path).unwrap());

    const WORKERS: usize = 6;
    let barrier = Arc::new(Barrier::new(WORKERS));
    let now = Utc.with_ymd_and_hms(2024, 6, 14, 20, 0, 0).unwrap();

    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = Database::open_at(&path).unwrap();
                let ctx = RequestContext::new(1).at(now);
                let snapshot = TriggerSnapshot {
                    trigger_count: 1,
                    max_severity: 0.5,
                    trigger_types: Vec::new(),
                };
                let level = 1 + (i % 3) as u8;
                barrier.wait();
                LifecycleManager::new()
                    .deploy(&db, &ctx, Domain::Business, level, &snapshot)
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let opened = outcomes
        .iter()
        .filter(|d| d.outcome == DeployOutcome::Opened)
        .count();
    assert_eq!(opened, 1);
    let id = outcomes[0].intervention_id;
    assert!(outcomes.iter().all(|d| d.intervention_id == id));

    let db = Database::open_at(&path).unwrap();
    let open = db.open_interventions(1).unwrap();
    assert_eq!(open.len(), 1);
    // Whatever the arrival order, the highest requested level wins.
    assert_eq!(open[0].intervention_level, 3);
}

#[test]
fn test_reopen_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("life_agent.db");
    let now = Utc.with_ymd_and_hms(2024, 6, 14, 20, 0, 0).unwrap();
    {
        let db = Database::open_at(&path).unwrap();
        db.log_commitment(&RequestContext::new(5).at(now), Domain::Finance, "Review budget")
            .unwrap();
    }
    let db = Database::open_at(&path).unwrap();
    let rows = db
        .commitments_after(5, None, now.date_naive() - chrono::Duration::days(1))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].commitment, "Review budget");
}
