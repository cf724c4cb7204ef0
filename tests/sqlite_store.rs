use league_sim::models::MatchResult;
use league_sim::sqlite_store::SqliteStore;
use league_sim::store::Repository;
use league_sim::LeagueError;

fn result(week: u32, home: u32, away: u32, hg: u32, ag: u32) -> MatchResult {
    MatchResult {
        week,
        home_team_id: home,
        away_team_id: away,
        home_goals: hg,
        away_goals: ag,
    }
}

fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::in_memory().unwrap();
    for (name, strength) in [("North", 80), ("South", 65), ("East", 70), ("West", 55)] {
        store.save_team(name, strength).unwrap();
    }
    store
}

#[test]
fn teams_come_back_in_id_order() {
    let store = seeded_store();
    let teams = store.list_teams().unwrap();
    let ids: Vec<u32> = teams.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(teams[2].name, "East");
    assert_eq!(teams[2].strength, 70);
}

#[test]
fn results_drive_table_and_remaining() {
    let mut store = seeded_store();
    let week_one: Vec<_> = store
        .list_remaining_matches()
        .unwrap()
        .into_iter()
        .filter(|f| f.week == 1)
        .collect();
    assert_eq!(week_one.len(), 2);
    for f in &week_one {
        store.save_match(&f.with_score(2, 1)).unwrap();
    }

    assert_eq!(store.all_matches().unwrap().len(), 2);
    assert_eq!(store.list_remaining_matches().unwrap().len(), 10);

    let table = store.get_table().unwrap();
    for f in &week_one {
        assert_eq!(table.get(f.home_team_id).unwrap().points, 3);
        assert_eq!(table.get(f.away_team_id).unwrap().points, 0);
    }
}

#[test]
fn duplicate_and_unknown_results_are_rejected() {
    let mut store = seeded_store();
    store.save_match(&result(1, 1, 4, 1, 0)).unwrap();
    assert_eq!(
        store.save_match(&result(1, 1, 4, 3, 3)).unwrap_err(),
        LeagueError::DuplicateMatch {
            week: 1,
            home: 1,
            away: 4
        }
    );
    assert_eq!(
        store.save_match(&result(1, 9, 4, 1, 0)).unwrap_err(),
        LeagueError::UnknownTeams { ids: vec![9] }
    );
    assert_eq!(
        store.save_match(&result(2, 3, 3, 1, 1)).unwrap_err(),
        LeagueError::SelfMatch { team: 3 }
    );
    assert_eq!(store.all_matches().unwrap().len(), 1);
}

#[test]
fn update_replaces_the_score() {
    let mut store = seeded_store();
    store.save_match(&result(1, 1, 4, 1, 0)).unwrap();
    store.update_match(&result(1, 1, 4, 0, 2)).unwrap();
    let matches = store.all_matches().unwrap();
    assert_eq!(matches, vec![result(1, 1, 4, 0, 2)]);

    assert_eq!(
        store.update_match(&result(2, 1, 3, 1, 1)).unwrap_err(),
        LeagueError::MatchNotFound {
            week: 2,
            home: 1,
            away: 3
        }
    );
}

#[test]
fn resets_restart_ids() {
    let mut store = seeded_store();
    store.save_match(&result(1, 1, 4, 1, 0)).unwrap();
    store.reset_matches().unwrap();
    assert!(store.all_matches().unwrap().is_empty());
    assert_eq!(store.list_teams().unwrap().len(), 4);

    store.save_match(&result(1, 2, 3, 0, 0)).unwrap();
    store.reset_teams().unwrap();
    assert!(store.list_teams().unwrap().is_empty());
    assert!(store.all_matches().unwrap().is_empty());
    assert_eq!(store.save_team("Fresh", 75).unwrap().id, 1);
}

#[test]
fn data_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("league.sqlite");
    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.save_team("Harbour", 90).unwrap();
        store.save_team("Valley", 60).unwrap();
        store.save_match(&result(1, 1, 2, 3, 1)).unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.list_teams().unwrap().len(), 2);
    let table = store.get_table().unwrap();
    assert_eq!(table.get(1).unwrap().points, 3);
    assert_eq!(table.get(2).unwrap().goal_diff, -2);
}
