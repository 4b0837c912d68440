//! Aggregation-to-script scenarios: bursts of edits close into one batch
//! whose rendered script preserves per-event command order.

use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::sleep;

use hotpush::deploy::{DeployContext, Script};
use hotpush::watcher::{Aggregator, ChangeEvent, ChangeKind};

#[tokio::test]
async fn repeated_edits_become_one_batch_with_ordered_commands() {
    let (event_tx, event_rx) = mpsc::channel(16);
    let (batch_tx, mut batch_rx) = mpsc::channel(16);
    tokio::spawn(Aggregator::new(Duration::from_millis(100)).run(event_rx, batch_tx));

    // The same file saved twice inside the quiet window
    event_tx
        .send(ChangeEvent::new(ChangeKind::Change, "/proj/src/a.ts"))
        .await
        .unwrap();
    sleep(Duration::from_millis(20)).await;
    event_tx
        .send(ChangeEvent::new(ChangeKind::Change, "/proj/src/a.ts"))
        .await
        .unwrap();

    let batch = batch_rx.recv().await.unwrap();
    assert_eq!(batch.len(), 2);

    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("update.sh");
    let ctx = DeployContext::new("/proj", "x", "pages/home");

    let script = Script::write(&script_path, &batch, &ctx, false).unwrap();
    let content = std::fs::read_to_string(script.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    // Redundant but ordered: one remove-then-push pair per event
    assert_eq!(lines.len(), 2);
    let expected =
        "adb -host shell rm -f /opt/app/x/src/a.ts && adb -host push /proj/src/a.ts /opt/app/x/src/a.ts";
    assert_eq!(lines[0], expected);
    assert_eq!(lines[1], expected);

    script.remove();
}

#[tokio::test]
async fn mixed_burst_preserves_arrival_order() {
    let (event_tx, event_rx) = mpsc::channel(16);
    let (batch_tx, mut batch_rx) = mpsc::channel(16);
    tokio::spawn(Aggregator::new(Duration::from_millis(60)).run(event_rx, batch_tx));

    for event in [
        ChangeEvent::new(ChangeKind::AddDir, "/proj/src/newdir"),
        ChangeEvent::new(ChangeKind::Add, "/proj/src/newdir/a.ts"),
        ChangeEvent::new(ChangeKind::Unlink, "/proj/src/old.ts"),
    ] {
        event_tx.send(event).await.unwrap();
    }

    let batch = batch_rx.recv().await.unwrap();
    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("update.sh");
    let ctx = DeployContext::new("/proj", "x", "pages/home");

    let script = Script::write(&script_path, &batch, &ctx, true).unwrap();
    let content = std::fs::read_to_string(script.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(
        lines,
        vec![
            "adb -host shell cd /opt/app/x && adb -host shell mkdir src/newdir",
            "adb -host push /proj/src/newdir/a.ts /opt/app/x/src/newdir/a.ts",
            "adb -host shell rm -f /opt/app/x/src/old.ts",
            "adb -host shell pkill -f x && adb -host shell sendlink pages/home",
        ]
    );

    script.remove();
}
