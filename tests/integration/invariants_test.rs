//! Structural invariant tests: single-context ownership, context
//! inheritance, upload shapes, batch targets. These go straight at the
//! database layer because the constraints and triggers are the last
//! line of defense behind the application checks.

use droplink_database::repositories::batch::BatchRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_entity::Context;
use droplink_entity::batch::CreateBatch;
use droplink_entity::folder::CreateFolder;
use droplink_entity::link::{CreateLink, LinkType};

use super::helpers;

async fn create_base_link(
    pool: &sqlx::PgPool,
    workspace_id: uuid::Uuid,
    owner_email: &str,
) -> (droplink_entity::link::Link, droplink_entity::folder::Folder) {
    LinkRepository::new(pool.clone())
        .create_with_owner(
            &CreateLink {
                workspace_id,
                slug: helpers::unique_slug("inv"),
                link_type: LinkType::Base,
                is_public: false,
                link_config: serde_json::json!({}),
                branding: serde_json::json!({}),
                source_folder_id: None,
            },
            owner_email,
            &[],
            "Uploads",
        )
        .await
        .expect("Failed to create link")
}

#[tokio::test]
async fn test_folder_rejects_dual_context() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "inv").await;
    let (link, _root) = create_base_link(&pool, workspace.id, &workspace.owner_email).await;

    let result = sqlx::query(
        "INSERT INTO folders (name, workspace_id, link_id) VALUES ('both', $1, $2)",
    )
    .bind(workspace.id)
    .bind(link.id)
    .execute(&pool)
    .await;
    assert!(result.is_err(), "dual-context folder must be rejected");
}

#[tokio::test]
async fn test_folder_context_must_match_parent() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace_a = helpers::create_workspace(&pool, "inv-a").await;
    let workspace_b = helpers::create_workspace(&pool, "inv-b").await;

    let folders = FolderRepository::new(pool.clone());
    let parent = folders
        .create(&CreateFolder {
            name: "parent".to_string(),
            parent_folder_id: None,
            context: Context::Workspace(workspace_a.id),
        })
        .await
        .expect("Failed to create parent");

    let result = folders
        .create(&CreateFolder {
            name: "child".to_string(),
            parent_folder_id: Some(parent.id),
            context: Context::Workspace(workspace_b.id),
        })
        .await;
    assert!(result.is_err(), "cross-context child must be rejected");
}

#[tokio::test]
async fn test_file_rejects_illegal_upload_shape() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "inv").await;
    let (link, _root) = create_base_link(&pool, workspace.id, &workspace.owner_email).await;

    // Link context without a batch: not one of the three shapes.
    let result = sqlx::query(
        "INSERT INTO files (name, file_size, storage_path, link_id) \
         VALUES ('x.bin', 1, 'links/x/root/x.bin', $1)",
    )
    .bind(link.id)
    .execute(&pool)
    .await;
    assert!(result.is_err(), "link upload without batch must be rejected");

    // Workspace context with a batch is the generated-link shape and is
    // allowed; workspace + link together never is.
    let result = sqlx::query(
        "INSERT INTO files (name, file_size, storage_path, workspace_id, link_id) \
         VALUES ('y.bin', 1, 'links/x/root/y.bin', $1, $2)",
    )
    .bind(workspace.id)
    .bind(link.id)
    .execute(&pool)
    .await;
    assert!(result.is_err(), "dual-context file must be rejected");
}

#[tokio::test]
async fn test_batch_target_must_match_link_type() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "inv").await;
    let (link, root) = create_base_link(&pool, workspace.id, &workspace.owner_email).await;

    let batches = BatchRepository::new(pool.clone());

    // Base links deposit into their root; a batch naming a target
    // folder is the generated-link form.
    let result = batches
        .create(&CreateBatch {
            link_id: link.id,
            uploader_name: "Alice".to_string(),
            uploader_email: None,
            target_folder_id: Some(root.id),
        })
        .await;
    assert!(result.is_err(), "base-link batch with target must be rejected");

    let batch = batches
        .create(&CreateBatch {
            link_id: link.id,
            uploader_name: "Alice".to_string(),
            uploader_email: None,
            target_folder_id: None,
        })
        .await
        .expect("targetless batch on base link must be accepted");
    assert_eq!(batch.link_id, link.id);
}

#[tokio::test]
async fn test_generated_link_requires_source_folder() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "inv").await;

    let result = sqlx::query(
        "INSERT INTO links (workspace_id, slug, link_type) VALUES ($1, $2, 'generated')",
    )
    .bind(workspace.id)
    .bind(helpers::unique_slug("gen"))
    .execute(&pool)
    .await;
    assert!(
        result.is_err(),
        "generated link without source folder must be rejected"
    );
}
