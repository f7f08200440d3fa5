use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use scratchcard_core::{
    Collection, MemoryRemote, PersistenceSync, Prize, RemoteStore, ScratchError, Storage,
    StoreConfig, SyncStatus, Winner,
};
use scratchcard_game::{
    ClaimRequest, PlayError, PlayPhase, PlaySettings, PointerInput, RevealStateMachine, RevealStep,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tokio::sync::broadcast;

/// Memory remote whose ledger reads and writes can be switched off.
#[derive(Default)]
struct FlakyRemote {
    inner: MemoryRemote,
    fail_winner_reads: AtomicBool,
    fail_winner_writes: AtomicBool,
}

impl FlakyRemote {
    fn unreachable() -> ScratchError {
        ScratchError::remote("connection reset")
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    async fn fetch_config(&self) -> scratchcard_core::Result<Option<StoreConfig>> {
        self.inner.fetch_config().await
    }

    async fn fetch_prizes(&self) -> scratchcard_core::Result<Vec<Prize>> {
        self.inner.fetch_prizes().await
    }

    async fn fetch_winners(&self) -> scratchcard_core::Result<Vec<Winner>> {
        if self.fail_winner_reads.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        self.inner.fetch_winners().await
    }

    async fn insert_winner(&self, winner: &Winner) -> scratchcard_core::Result<()> {
        if self.fail_winner_writes.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        self.inner.insert_winner(winner).await
    }

    async fn upsert_config(&self, config: &StoreConfig) -> scratchcard_core::Result<()> {
        self.inner.upsert_config(config).await
    }

    async fn replace_prizes(&self, prizes: &[Prize]) -> scratchcard_core::Result<()> {
        self.inner.replace_prizes(prizes).await
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.inner.subscribe()
    }
}

fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

async fn open_with(remote: Arc<FlakyRemote>) -> (TempDir, Arc<PersistenceSync>) {
    let temp_dir = tempdir().unwrap();
    let storage = Arc::new(Storage::new(&temp_dir.path().join("play.db")).await.unwrap());
    let sync = PersistenceSync::open(storage, Some(remote as Arc<dyn RemoteStore>))
        .await
        .unwrap();
    (temp_dir, Arc::new(sync))
}

/// Pool A (winning) / B (losing), in the two casings seen in stored rows.
fn seed_prizes(remote: &FlakyRemote) {
    remote.inner.insert_raw(
        Collection::Prizes,
        json!({ "id": "a", "name": "A", "description": "", "isWinning": true }),
    );
    remote.inner.insert_raw(
        Collection::Prizes,
        json!({ "id": 2, "name": "B", "iswinning": false }),
    );
}

fn machine(sync: Arc<PersistenceSync>) -> RevealStateMachine {
    RevealStateMachine::new(sync, PlaySettings::default()).with_clock(morning)
}

fn expect_reveal(step: Option<RevealStep>) -> Winner {
    match step {
        Some(RevealStep::Revealed(record)) => record,
        other => panic!("expected a reveal, got {:?}", other),
    }
}

#[tokio::test]
async fn test_scratched_play_appends_one_record() {
    let remote = Arc::new(FlakyRemote::default());
    seed_prizes(&remote);
    let (_dir, sync) = open_with(remote.clone()).await;
    sync.load().await;

    let mut machine = machine(sync.clone());
    let attempt = machine
        .claim(&ClaimRequest::new("Ana", "529.982.247-25"))
        .unwrap();
    assert!(attempt.prize.name == "A" || attempt.prize.name == "B");
    assert_eq!(attempt.code.len(), 5);
    assert!(attempt
        .code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

    let mut reveals = Vec::new();
    for y in [20.0, 70.0, 120.0, 170.0, 220.0, 250.0] {
        reveals.extend(machine.pointer(PointerInput::Down { x: 0.0, y }));
        let mut x = 0.0;
        while x <= 480.0 {
            reveals.extend(machine.pointer(PointerInput::Move { x, y }));
            x += 10.0;
        }
        reveals.extend(machine.pointer(PointerInput::Up));
    }
    assert_eq!(reveals.len(), 1);
    assert!(machine.is_revealed());
    assert_eq!(machine.can_redeem(), attempt.prize.name == "A");

    let record = expect_reveal(reveals.pop());
    assert_eq!(machine.commit_outcome().await.unwrap().unwrap(), record);

    assert_eq!(remote.inner.row_count(Collection::Winners), 1);
    assert_eq!(record.user_name, "Ana");
    assert_eq!(record.user_identity, "52998224725");
    assert_eq!(record.prize_name, attempt.prize.name);
    assert_eq!(record.prize_code, attempt.code);
    assert_eq!(record.timestamp, "18/10/2026, 09:15:00");
    assert_eq!(sync.current_status(), SyncStatus::Saved);
    assert_eq!(sync.winners(), vec![record]);
}

#[tokio::test]
async fn test_same_day_replay_never_allocates() {
    let remote = Arc::new(FlakyRemote::default());
    remote.inner.insert_raw(
        Collection::Winners,
        json!({
            "id": 1,
            "userName": "Ana",
            "userCpf": "529.982.247-25",
            "prizeName": "Brinde",
            "prizeCode": "ZZ9ZZ",
            "date": "18/10/2026, 08:00:00"
        }),
    );
    let (_dir, sync) = open_with(remote.clone()).await;
    sync.load().await;

    let mut machine = machine(sync);
    let result = machine.claim(&ClaimRequest::new("Ana", "52998224725"));

    assert!(matches!(result, Err(PlayError::AlreadyPlayedToday { .. })));
    assert_eq!(machine.phase(), PlayPhase::Idle);
    assert!(machine.attempt().is_none());
    assert_eq!(remote.inner.row_count(Collection::Winners), 1);
}

#[tokio::test]
async fn test_forced_reveal_appends_once() {
    let remote = Arc::new(FlakyRemote::default());
    let (_dir, sync) = open_with(remote.clone()).await;

    let mut machine = machine(sync);
    machine
        .claim(&ClaimRequest::new("Bruno", "111.444.777-35"))
        .unwrap();

    let record = expect_reveal(machine.force_reveal());
    assert!(machine.force_reveal().is_none());
    assert!(machine.pointer(PointerInput::Down { x: 1.0, y: 1.0 }).is_none());

    assert_eq!(machine.commit_outcome().await.unwrap().unwrap(), record);
    assert_eq!(remote.inner.row_count(Collection::Winners), 1);
}

#[tokio::test]
async fn test_ledger_read_failure_keeps_cached_ledger() {
    let remote = Arc::new(FlakyRemote::default());
    seed_prizes(&remote);
    let (_dir, sync) = open_with(remote.clone()).await;

    let mut first = machine(sync.clone());
    first.claim(&ClaimRequest::new("Ana", "52998224725")).unwrap();
    expect_reveal(first.force_reveal());
    first.commit_outcome().await.unwrap().unwrap();
    assert_eq!(sync.winners().len(), 1);

    remote.inner.insert_raw(
        Collection::Prizes,
        json!({ "id": "c", "name": "Camiseta", "isWinning": true }),
    );
    remote.fail_winner_reads.store(true, Ordering::SeqCst);

    let snapshot = sync.load().await;

    assert_eq!(snapshot.prizes.len(), 3);
    assert_eq!(snapshot.winners.len(), 1);
    assert_eq!(
        sync.current_status(),
        SyncStatus::ReadDegraded {
            failed: vec![Collection::Winners]
        }
    );

    // the cached ledger still blocks a replay
    let mut second = machine(sync);
    assert!(second
        .claim(&ClaimRequest::new("Ana", "529.982.247-25"))
        .is_err());
}

#[tokio::test]
async fn test_append_failure_leaves_play_revealed() {
    let remote = Arc::new(FlakyRemote::default());
    remote.fail_winner_writes.store(true, Ordering::SeqCst);
    let (_dir, sync) = open_with(remote.clone()).await;

    let mut machine = machine(sync.clone());
    machine.claim(&ClaimRequest::new("Ana", "52998224725")).unwrap();
    expect_reveal(machine.force_reveal());

    let result = machine.commit_outcome().await.unwrap();

    assert!(matches!(result, Err(PlayError::Core(_))));
    assert!(machine.is_revealed());
    assert!(machine.record().is_some());
    assert!(sync.winners().is_empty());
    assert_eq!(remote.inner.row_count(Collection::Winners), 0);
    assert!(matches!(
        sync.current_status(),
        SyncStatus::WriteFailed { .. }
    ));
}
