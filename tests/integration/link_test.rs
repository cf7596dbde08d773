//! Link creation atomicity, slug conflicts, removal re-homing, and the
//! editor grant lifecycle.

use std::sync::Arc;

use droplink_core::error::ErrorKind;
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::permission::PermissionRepository;
use droplink_entity::UploadKind;
use droplink_entity::file::CreateFile;
use droplink_entity::link::{CreateLink, LinkType};
use droplink_entity::permission::PermissionRole;
use droplink_service::RequestContext;
use droplink_service::permission::PermissionResolver;

use super::helpers;

fn create_link_data(workspace_id: uuid::Uuid, slug: String) -> CreateLink {
    CreateLink {
        workspace_id,
        slug,
        link_type: LinkType::Custom,
        is_public: false,
        link_config: serde_json::json!({}),
        branding: serde_json::json!({}),
        source_folder_id: None,
    }
}

#[tokio::test]
async fn test_create_with_owner_is_one_atomic_unit() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "link").await;
    let links = LinkRepository::new(pool.clone());

    let editors = vec![
        helpers::unique_email("editor1"),
        helpers::unique_email("editor2"),
    ];
    let (link, root) = links
        .create_with_owner(
            &create_link_data(workspace.id, helpers::unique_slug("atomic")),
            &workspace.owner_email,
            &editors,
            "Uploads",
        )
        .await
        .expect("Failed to create link");

    // Root folder lives in the link context.
    assert_eq!(root.link_id, Some(link.id));
    assert_eq!(root.workspace_id, None);
    assert_eq!(root.parent_folder_id, None);

    let grants = PermissionRepository::new(pool.clone())
        .list_for_link(link.id)
        .await
        .expect("Failed to list grants");
    assert_eq!(grants.len(), 3);

    // Owner first, auto-verified; editors start unverified.
    assert_eq!(grants[0].role, PermissionRole::Owner);
    assert_eq!(grants[0].email, workspace.owner_email);
    assert!(grants[0].is_verified);
    for grant in &grants[1..] {
        assert_eq!(grant.role, PermissionRole::Editor);
        assert!(!grant.is_verified);
    }
}

#[tokio::test]
async fn test_duplicate_slug_is_conflict_with_no_side_effects() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "link").await;
    let links = LinkRepository::new(pool.clone());
    let slug = helpers::unique_slug("taken");

    links
        .create_with_owner(
            &create_link_data(workspace.id, slug.clone()),
            &workspace.owner_email,
            &[],
            "Uploads",
        )
        .await
        .expect("First claim must win");

    let err = links
        .create_with_owner(
            &create_link_data(workspace.id, slug.clone()),
            &workspace.owner_email,
            &[],
            "Uploads",
        )
        .await
        .expect_err("Second claim must lose");
    assert_eq!(err.kind, ErrorKind::Conflict);

    // The losing transaction left nothing behind.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE slug = $1")
        .bind(&slug)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_remove_rehomes_content_into_workspace() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "link").await;
    let links = LinkRepository::new(pool.clone());

    let (link, root) = links
        .create_with_owner(
            &create_link_data(workspace.id, helpers::unique_slug("rehome")),
            &workspace.owner_email,
            &[],
            "Uploads",
        )
        .await
        .expect("Failed to create link");

    let batch = droplink_database::repositories::batch::BatchRepository::new(pool.clone())
        .create(&droplink_entity::batch::CreateBatch {
            link_id: link.id,
            uploader_name: "Bob".to_string(),
            uploader_email: None,
            target_folder_id: None,
        })
        .await
        .expect("Failed to open batch");

    let files = FileRepository::new(pool.clone());
    let file = files
        .create(&CreateFile {
            name: "deposit.bin".to_string(),
            file_size: 64,
            mime_type: None,
            storage_path: format!("links/{}/root/deposit.bin", link.id),
            folder_id: Some(root.id),
            kind: UploadKind::LinkUpload {
                link_id: link.id,
                batch_id: batch.id,
            },
        })
        .await
        .expect("Failed to create file");

    links.remove(link.id).await.expect("Failed to remove link");

    assert!(links.find_by_id(link.id).await.unwrap().is_none());

    // The uploaded content survives, now owned by the workspace.
    let rehomed_folder = FolderRepository::new(pool.clone())
        .find_by_id(root.id)
        .await
        .unwrap()
        .expect("Root folder must survive removal");
    assert_eq!(rehomed_folder.workspace_id, Some(workspace.id));
    assert_eq!(rehomed_folder.link_id, None);

    let rehomed_file = files
        .find_by_id(file.id)
        .await
        .unwrap()
        .expect("File must survive removal");
    assert_eq!(rehomed_file.workspace_id, Some(workspace.id));
    assert_eq!(rehomed_file.link_id, None);
    assert_eq!(rehomed_file.batch_id, None);
}

#[tokio::test]
async fn test_editor_grant_lifecycle() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "link").await;
    let links = LinkRepository::new(pool.clone());

    let (link, _) = links
        .create_with_owner(
            &create_link_data(workspace.id, helpers::unique_slug("grants")),
            &workspace.owner_email,
            &[],
            "Uploads",
        )
        .await
        .expect("Failed to create link");

    let resolver = PermissionResolver::new(Arc::new(PermissionRepository::new(pool.clone())));
    let owner_ctx = RequestContext::authenticated(workspace.owner_email.clone());
    let editor_email = helpers::unique_email("invitee");
    let editor_ctx = RequestContext::authenticated(editor_email.clone());

    let grant = resolver
        .invite_editor(&owner_ctx, link.id, &editor_email)
        .await
        .expect("Owner must be able to invite");
    assert_eq!(grant.role, PermissionRole::Editor);
    assert!(!grant.is_verified);

    // Unverified editors hold no effective role yet.
    let err = resolver
        .require_role(&editor_ctx, link.id, PermissionRole::Editor)
        .await
        .expect_err("Unverified grant must confer nothing");
    assert_eq!(err.kind, ErrorKind::Forbidden);

    // Only the owner may invite.
    let err = resolver
        .invite_editor(&editor_ctx, link.id, "someone@example.com")
        .await
        .expect_err("Editors must not invite");
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let confirmed = resolver
        .confirm_grant(&editor_ctx, link.id)
        .await
        .expect("Invitee must be able to confirm");
    assert!(confirmed.is_verified);
    resolver
        .require_role(&editor_ctx, link.id, PermissionRole::Editor)
        .await
        .expect("Verified editor must pass the role check");

    resolver
        .revoke_grant(&owner_ctx, link.id, confirmed.id)
        .await
        .expect("Owner must be able to revoke an editor");
    let err = resolver
        .require_role(&editor_ctx, link.id, PermissionRole::Editor)
        .await
        .expect_err("Revoked grant must be gone");
    assert_eq!(err.kind, ErrorKind::Forbidden);

    // The owner grant itself is not revocable.
    let grants = PermissionRepository::new(pool.clone())
        .list_for_link(link.id)
        .await
        .unwrap();
    let err = resolver
        .revoke_grant(&owner_ctx, link.id, grants[0].id)
        .await
        .expect_err("Owner grant must survive");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_midtransaction_failure_rolls_back_whole_unit() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    // A trigger keyed on one sentinel email fails the editor grant
    // insert, after the link and owner rows were already written in
    // the same transaction.
    sqlx::query(
        "CREATE OR REPLACE FUNCTION reject_blocked_editor_grant() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'editor grant rejected'; END; \
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("DROP TRIGGER IF EXISTS reject_blocked_editor_grant ON permissions")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_blocked_editor_grant BEFORE INSERT ON permissions \
         FOR EACH ROW WHEN (NEW.email = 'blocked-editor@invalid.test') \
         EXECUTE FUNCTION reject_blocked_editor_grant()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let workspace = helpers::create_workspace(&pool, "link").await;
    let links = LinkRepository::new(pool.clone());
    let slug = helpers::unique_slug("rollback");
    let first_editor = helpers::unique_email("editor");

    let err = links
        .create_with_owner(
            &create_link_data(workspace.id, slug.clone()),
            &workspace.owner_email,
            &[first_editor.clone(), "blocked-editor@invalid.test".to_string()],
            "Uploads",
        )
        .await
        .expect_err("Failed grant must fail the whole unit");
    assert_eq!(err.kind, ErrorKind::Database);

    // The link, the owner grant, and the first editor grant all rolled
    // back with the failed one.
    let links_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE slug = $1")
        .bind(&slug)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links_left, 0);
    let grants_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE email = $1")
        .bind(&first_editor)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(grants_left, 0);

    sqlx::query("DROP TRIGGER IF EXISTS reject_blocked_editor_grant ON permissions")
        .execute(&pool)
        .await
        .unwrap();
}
