use std::sync::atomic::AtomicUsize;

use engine::overlay::PageInstruction;
use engine::render::JsonRenderer;
use engine::transform::FieldRect;
use serde_json::json;
use tokio::time::{Instant, sleep, timeout};

use super::*;

const DEBOUNCE: Duration = Duration::from_millis(800);

/// JSON renderer that counts its calls.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
}

impl DocumentRenderer for CountingRenderer {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, instructions: &[PageInstruction]) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        JsonRenderer::default().render(instructions)
    }
}

struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn file_extension(&self) -> &'static str {
        "bin"
    }

    fn render(&self, _instructions: &[PageInstruction]) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Backend("disk full".into()))
    }
}

fn request(name: &str) -> PreviewRequest {
    PreviewRequest {
        fields: vec![Field::new("name", 1, FieldRect::new(0.1, 0.2, 0.3, 0.05))],
        page_dims: HashMap::from([(1, PageDimensions::new(600.0, 800.0))]),
        record: GenerationRecord::from_value(json!({ "name": name })).unwrap(),
        options: GenerateOptions::default(),
        file_name: "t_filled.json".into(),
    }
}

fn counting() -> (PreviewScheduler, Arc<CountingRenderer>) {
    let renderer = Arc::new(CountingRenderer::default());
    (PreviewScheduler::new(DEBOUNCE, renderer.clone()), renderer)
}

fn body(state: &PreviewState) -> String {
    let output = state.output().unwrap();
    String::from_utf8(output.bytes.clone()).unwrap()
}

// =============================================================
// Debounce
// =============================================================

#[tokio::test(start_paused = true)]
async fn publishes_after_quiet_period() {
    let (mut scheduler, renderer) = counting();
    let mut rx = scheduler.subscribe();
    let start = Instant::now();

    scheduler.schedule(request("Ada"));
    rx.changed().await.unwrap();

    assert!(start.elapsed() >= DEBOUNCE);
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.output().unwrap().instruction_count, 1);
    assert_eq!(state.output().unwrap().file_name, "t_filled.json");
    assert!(body(&state).contains("Ada"));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn nothing_published_before_debounce() {
    let (mut scheduler, renderer) = counting();
    let rx = scheduler.subscribe();

    scheduler.schedule(request("Ada"));
    sleep(DEBOUNCE - Duration::from_millis(1)).await;

    assert!(!rx.has_changed().unwrap());
    assert!(scheduler.is_pending());
    assert!(matches!(scheduler.latest(), PreviewState::Empty));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn newer_request_supersedes_older() {
    let (mut scheduler, renderer) = counting();
    let mut rx = scheduler.subscribe();
    let start = Instant::now();

    scheduler.schedule(request("first"));
    sleep(Duration::from_millis(300)).await;
    scheduler.schedule(request("second"));
    rx.changed().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(1100));
    let state = rx.borrow_and_update().clone();
    assert!(body(&state).contains("second"));
    assert!(!body(&state).contains("first"));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);

    assert!(timeout(Duration::from_secs(5), rx.changed()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_request() {
    let (mut scheduler, renderer) = counting();
    let mut rx = scheduler.subscribe();

    scheduler.schedule(request("Ada"));
    scheduler.cancel();

    assert!(!scheduler.is_pending());
    assert!(timeout(Duration::from_secs(5), rx.changed()).await.is_err());
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

// =============================================================
// render_now
// =============================================================

#[tokio::test(start_paused = true)]
async fn render_now_supersedes_pending() {
    let (mut scheduler, renderer) = counting();
    let mut rx = scheduler.subscribe();

    scheduler.schedule(request("stale"));
    let output = scheduler.render_now(request("fresh")).await.unwrap();
    assert!(String::from_utf8_lossy(&output.bytes).contains("fresh"));
    drop(rx.borrow_and_update());

    assert!(timeout(Duration::from_secs(5), rx.changed()).await.is_err());
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failures_are_published() {
    let mut scheduler = PreviewScheduler::new(DEBOUNCE, Arc::new(FailingRenderer));
    let mut rx = scheduler.subscribe();

    let err = scheduler.render_now(request("Ada")).await.unwrap_err();
    assert!(matches!(err, PreviewError::Render(RenderError::Backend(_))));
    assert!(matches!(scheduler.latest(), PreviewState::Failed(msg) if msg.contains("disk full")));

    scheduler.schedule(request("Ada"));
    drop(rx.borrow_and_update());
    rx.changed().await.unwrap();
    assert!(matches!(&*rx.borrow(), PreviewState::Failed(_)));
}

// =============================================================
// Buffer release
// =============================================================

#[tokio::test(start_paused = true)]
async fn superseded_output_is_released() {
    let (mut scheduler, _) = counting();

    let first = scheduler.render_now(request("one")).await.unwrap();
    let first_weak = Arc::downgrade(&first);
    drop(first);
    assert!(first_weak.upgrade().is_some());

    let second = scheduler.render_now(request("two")).await.unwrap();
    assert!(first_weak.upgrade().is_none());

    let second_weak = Arc::downgrade(&second);
    drop(second);
    scheduler.close();
    assert!(second_weak.upgrade().is_none());
    assert!(matches!(scheduler.latest(), PreviewState::Empty));
}

// =============================================================
// Publication
// =============================================================

fn failed_message(state: &PreviewState) -> Option<&str> {
    match state {
        PreviewState::Failed(message) => Some(message.as_str()),
        _ => None,
    }
}

#[test]
fn stale_publish_leaves_state_untouched() {
    let sequence = AtomicU64::new(0);
    let (state, rx) = watch::channel(PreviewState::Empty);

    let old = advance(&sequence, &state);
    let new = advance(&sequence, &state);
    assert_eq!((old, new), (1, 2));
    assert!(!rx.has_changed().unwrap());

    assert!(!publish(&sequence, &state, old, PreviewState::Failed("old".into())));
    assert!(!rx.has_changed().unwrap());
    assert!(matches!(*rx.borrow(), PreviewState::Empty));

    assert!(publish(&sequence, &state, new, PreviewState::Failed("new".into())));
    assert!(rx.has_changed().unwrap());
    assert_eq!(failed_message(&rx.borrow()), Some("new"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_stale_publish_never_wins() {
    let sequence = Arc::new(AtomicU64::new(0));
    let (state, rx) = watch::channel(PreviewState::Empty);
    let state = Arc::new(state);

    for round in 0..200 {
        let old = advance(&sequence, &state);
        let stale = {
            let sequence = Arc::clone(&sequence);
            let state = Arc::clone(&state);
            tokio::task::spawn_blocking(move || {
                publish(&sequence, &state, old, PreviewState::Failed(format!("old {round}")));
            })
        };
        let new = advance(&sequence, &state);
        assert!(publish(&sequence, &state, new, PreviewState::Failed(format!("new {round}"))));
        stale.await.unwrap();

        assert_eq!(failed_message(&rx.borrow()), Some(format!("new {round}").as_str()));
    }
}

// =============================================================
// File writer
// =============================================================

#[tokio::test(start_paused = true)]
async fn stopped_writer_leaves_file_to_caller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t_filled.json");
    let (mut scheduler, _) = counting();
    let writer = PreviewWriter::spawn(scheduler.subscribe(), path.clone());

    scheduler.render_now(request("first")).await.unwrap();
    for _ in 0..100 {
        if path.exists() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(std::fs::read_to_string(&path).unwrap().contains("first"));

    writer.stop().await;
    std::fs::write(&path, "final").unwrap();
    scheduler.render_now(request("late")).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "final");
}
