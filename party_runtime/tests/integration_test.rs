//! Integration tests for party_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use party_engine::domain::{Gender, PartyId, PlayerId, PlayerProfile, Position};
use party_engine::engine::PartyEngine;
use party_engine::events::{ActionEnvelope, PartyAction};
use party_engine::hashing::canonical_hash;
use party_engine::hooks::AllowAll;
use party_engine::telemetry::init_tracing;

use party_runtime::action_log::ActionLog;
use party_runtime::config::RuntimeConfig;
use party_runtime::errors::RuntimeError;
use party_runtime::proto_bridge::{kernel_to_proto, proto_to_kernel};
use party_runtime::replay;
use party_runtime::session::{Session, SharedSession};
use party_runtime::snapshot;

fn load_fixture() -> Vec<ActionEnvelope> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("party_engine")
        .join("tests")
        .join("fixtures")
        .join("scenario.json");
    let data = fs::read_to_string(&path).expect("Failed to read scenario.json");
    serde_json::from_str(&data).expect("Failed to parse scenario.json")
}

fn temp_dir(name: &str) -> PathBuf {
    init_tracing("warn");
    let dir = std::env::temp_dir().join("party_runtime_tests").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn config(dir: &Path, snapshot_interval: u64) -> RuntimeConfig {
    RuntimeConfig {
        data_dir: dir.to_path_buf(),
        snapshot_interval,
        ..RuntimeConfig::default()
    }
}

fn profile(id: u32, name: &str, level: u32) -> PlayerProfile {
    PlayerProfile {
        id: PlayerId(id),
        name: name.to_string(),
        level,
        health: 100,
        max_health: 100,
        mana: 50,
        max_mana: 100,
        position: Position::new(100, 100, 7),
        gender: Gender::Female,
        vocation: 3,
        exempt_from_activity: false,
        summons: Vec::new(),
    }
}

/// Three players, one party of leader 1 with members 2 and 3.
fn play_party(session: &mut Session) {
    let mut t = 1_000;
    let mut go = |action: PartyAction| {
        t += 100;
        session.submit(t, action).expect("submit");
    };
    go(PartyAction::PlayerEnter { profile: profile(1, "Lars", 30) });
    go(PartyAction::PlayerEnter { profile: profile(2, "Ann", 25) });
    go(PartyAction::PlayerEnter { profile: profile(3, "Bo", 28) });
    for invitee in [2, 3] {
        go(PartyAction::Invite {
            inviter: PlayerId(1),
            invitee: PlayerId(invitee),
        });
        go(PartyAction::Join {
            player: PlayerId(invitee),
            leader: PlayerId(1),
        });
    }
    go(PartyAction::SetSharedExperience {
        player: PlayerId(1),
        active: true,
    });
}

// ─────────────────────────────────────────────────────────────

#[test]
fn log_round_trip_matches_direct_replay() {
    let dir = temp_dir("log_round_trip");
    let actions = load_fixture();

    let mut direct = PartyEngine::new();
    direct.apply_sequence(&actions).expect("fixture applies");
    let expected = canonical_hash(direct.state()).unwrap();

    let log_path = dir.join("actions.log");
    {
        let mut log = ActionLog::open(&log_path).expect("open log");
        for action in &actions {
            log.append(&kernel_to_proto(action)).expect("append");
        }
    }
    let log = ActionLog::open(&log_path).expect("reopen log");
    assert_eq!(log.last_sequence(), actions.len() as u64);

    let decoded = log
        .load_all()
        .unwrap()
        .iter()
        .map(proto_to_kernel)
        .collect::<Result<Vec<_>, _>>()
        .expect("bridge");
    assert_eq!(decoded, actions);
    assert_eq!(replay::rebuild_hash(&decoded).unwrap(), expected);
    assert!(replay::verify_determinism(&decoded).unwrap());
}

#[test]
fn new_session_starts_with_configured_constants() {
    let dir = temp_dir("constants_first");
    let mut cfg = config(&dir, 0);
    cfg.constants.max_status_distance = 12;
    let session = Session::open(&cfg, "s1").expect("open");
    assert_eq!(session.current_sequence(), 1);
    assert_eq!(session.state().constants.max_status_distance, 12);
}

#[test]
fn reopened_session_has_same_hash() {
    let dir = temp_dir("reopen");
    let cfg = config(&dir, 0);
    let (hash, seq) = {
        let mut session = Session::open(&cfg, "s1").unwrap();
        play_party(&mut session);
        (session.current_hash().unwrap(), session.current_sequence())
    };

    let mut session = Session::open(&cfg, "s1").unwrap();
    assert_eq!(session.current_sequence(), seq);
    assert_eq!(session.current_hash().unwrap(), hash);
    assert_eq!(session.replay_full().unwrap(), hash);
    assert_eq!(session.state().party_of(PlayerId(3)), Some(PartyId(1)));
}

#[test]
fn snapshot_resume_matches_full_replay() {
    let dir = temp_dir("snapshot_parity");
    let cfg = config(&dir, 4);
    let hash = {
        let mut session = Session::open(&cfg, "s1").unwrap();
        play_party(&mut session);
        session.current_hash().unwrap()
    };

    let snaps = dir.join("s1").join("snapshots");
    let latest = snapshot::load_latest_snapshot(&snaps).unwrap().expect("snapshot written");
    assert_eq!(latest.sequence, 8);
    assert!(snapshot::verify_snapshot_hash(&latest).unwrap());

    let log = ActionLog::open(&dir.join("s1").join("actions.log")).unwrap();
    let tail = log
        .load_after(latest.sequence)
        .unwrap()
        .iter()
        .map(proto_to_kernel)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(tail.len(), 1);
    let seq = latest.sequence;
    let state = snapshot::restore(latest).unwrap();
    let (_, rebuilt) = replay::rebuild_from(state, seq, Box::new(AllowAll), &tail).unwrap();
    assert_eq!(rebuilt, hash);

    let resumed = Session::open(&cfg, "s1").unwrap();
    assert_eq!(resumed.current_hash().unwrap(), hash);
}

#[test]
fn tampered_snapshot_falls_back_to_full_replay() {
    let dir = temp_dir("tampered_snapshot");
    let cfg = config(&dir, 4);
    let hash = {
        let mut session = Session::open(&cfg, "s1").unwrap();
        play_party(&mut session);
        session.current_hash().unwrap()
    };

    let snaps = dir.join("s1").join("snapshots");
    let mut snap = snapshot::load_snapshot(&snaps, 8).unwrap().unwrap();
    snap.state.players.get_mut(&PlayerId(2)).unwrap().level = 99;
    fs::write(
        snaps.join("snapshot_000008.json"),
        serde_json::to_vec(&snap).unwrap(),
    )
    .unwrap();
    assert!(matches!(
        snapshot::restore(snap),
        Err(RuntimeError::SnapshotHash { sequence: 8 })
    ));

    let session = Session::open(&cfg, "s1").unwrap();
    assert_eq!(session.current_hash().unwrap(), hash);
    assert_eq!(session.state().players[&PlayerId(2)].level, 25);
}

#[test]
fn engine_faults_are_not_persisted() {
    let dir = temp_dir("faults_not_persisted");
    let cfg = config(&dir, 0);
    let mut session = Session::open(&cfg, "s1").unwrap();
    play_party(&mut session);
    let seq = session.current_sequence();
    let hash = session.current_hash().unwrap();

    let stale = ActionEnvelope::new(seq, 5_000, PartyAction::Leave { player: PlayerId(2) });
    assert!(matches!(session.apply(&stale), Err(RuntimeError::Engine(_))));
    let rewind = ActionEnvelope::new(seq + 1, 10, PartyAction::Leave { player: PlayerId(2) });
    assert!(matches!(session.apply(&rewind), Err(RuntimeError::Engine(_))));

    assert_eq!(session.current_sequence(), seq);
    assert_eq!(session.current_hash().unwrap(), hash);
    let log = ActionLog::open(&dir.join("s1").join("actions.log")).unwrap();
    assert_eq!(log.last_sequence(), seq);
}

#[test]
fn rejected_actions_are_logged_and_replayed() {
    let dir = temp_dir("rejections_logged");
    let cfg = config(&dir, 0);
    let hash = {
        let mut session = Session::open(&cfg, "s1").unwrap();
        play_party(&mut session);
        let result = session
            .submit(
                9_000,
                PartyAction::Invite {
                    inviter: PlayerId(2),
                    invitee: PlayerId(3),
                },
            )
            .unwrap();
        assert!(!result.success);
        session.current_hash().unwrap()
    };

    let session = Session::open(&cfg, "s1").unwrap();
    assert_eq!(session.current_sequence(), 10);
    assert_eq!(session.current_hash().unwrap(), hash);
}

#[test]
fn concurrent_sessions_are_isolated() {
    let dir = temp_dir("concurrent_sessions");
    let cfg = config(&dir, 0);
    let sessions: Vec<Arc<SharedSession>> = ["a", "b"]
        .iter()
        .map(|id| Arc::new(SharedSession::new(Session::open(&cfg, id).unwrap())))
        .collect();

    let handles: Vec<_> = sessions
        .iter()
        .enumerate()
        .map(|(i, shared)| {
            let shared = Arc::clone(shared);
            thread::spawn(move || {
                for n in 0..5u32 {
                    let id = 10 * (i as u32 + 1) + n;
                    shared
                        .submit(
                            u64::from(n + 1) * 100,
                            PartyAction::PlayerEnter {
                                profile: profile(id, &format!("P{}", id), 20),
                            },
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for shared in &sessions {
        assert_eq!(shared.current_sequence().unwrap(), 6);
    }
    assert_ne!(
        sessions[0].current_hash().unwrap(),
        sessions[1].current_hash().unwrap()
    );
}
