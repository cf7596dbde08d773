//! Usage counter tests: idempotent adjustments, the zero floor, and
//! reconciliation against live rows.

use uuid::Uuid;

use droplink_core::traits::{UsageCounter, UsageOperation};
use droplink_database::repositories::counter::WorkspaceUsageCounter;
use droplink_database::repositories::file::FileRepository;
use droplink_entity::UploadKind;
use droplink_entity::file::CreateFile;

use super::helpers;

#[tokio::test]
async fn test_adjust_is_idempotent_per_operation_and_file() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "quota").await;
    let counter = WorkspaceUsageCounter::new(pool.clone());
    let file_id = Uuid::new_v4();

    counter
        .adjust(workspace.id, 100, UsageOperation::Upload, file_id)
        .await
        .expect("First adjust failed");
    // Retrying the same confirmed upload must not double-bill.
    counter
        .adjust(workspace.id, 100, UsageOperation::Upload, file_id)
        .await
        .expect("Replay must be a no-op");

    assert_eq!(counter.current(workspace.id).await.unwrap(), 100);

    // The delete side uses a different ledger key for the same file.
    counter
        .adjust(workspace.id, -100, UsageOperation::Delete, file_id)
        .await
        .expect("Delete adjust failed");
    assert_eq!(counter.current(workspace.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_counter_never_goes_negative() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "quota").await;
    let counter = WorkspaceUsageCounter::new(pool.clone());

    counter
        .adjust(workspace.id, -500, UsageOperation::Delete, Uuid::new_v4())
        .await
        .expect("Adjust failed");
    assert_eq!(counter.current(workspace.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reconcile_recomputes_from_live_rows() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "quota").await;
    let counter = WorkspaceUsageCounter::new(pool.clone());

    FileRepository::new(pool.clone())
        .create(&CreateFile {
            name: "ledger.bin".to_string(),
            file_size: 64,
            mime_type: None,
            storage_path: format!("workspaces/{}/root/ledger.bin", workspace.id),
            folder_id: None,
            kind: UploadKind::Personal {
                workspace_id: workspace.id,
            },
        })
        .await
        .expect("Failed to create file row");

    // The row was created without billing it, so the counter has
    // drifted by exactly the file size.
    let correction = counter.reconcile(workspace.id).await.expect("Reconcile failed");
    assert_eq!(correction, 64);
    assert_eq!(counter.current(workspace.id).await.unwrap(), 64);

    // A second pass finds nothing to fix.
    assert_eq!(counter.reconcile(workspace.id).await.unwrap(), 0);
}
