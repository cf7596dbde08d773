//! Folder creation and listing.
//!
//! Every folder write passes the context validator before it reaches
//! the database; the inheritance trigger rejects the same writes a
//! second time.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::types::{PageRequest, PageResponse};
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_entity::context::{self, Context};
use droplink_entity::file::File;
use droplink_entity::folder::{CreateFolder, Folder};

/// Request to create a folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder (None = a root of the context).
    pub parent_folder_id: Option<Uuid>,
    /// The owning context.
    pub context: Context,
}

/// Manages folder creation and content listing.
#[derive(Debug, Clone)]
pub struct FolderService {
    folder_repo: Arc<FolderRepository>,
    file_repo: Arc<FileRepository>,
}

impl FolderService {
    /// Create a new folder service.
    pub fn new(folder_repo: Arc<FolderRepository>, file_repo: Arc<FileRepository>) -> Self {
        Self {
            folder_repo,
            file_repo,
        }
    }

    /// Create a folder, validating its context against the parent's.
    pub async fn create_folder(&self, req: CreateFolderRequest) -> AppResult<Folder> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Folder name may not be empty"));
        }

        let parent_context = match req.parent_folder_id {
            Some(parent_id) => {
                let parent = self
                    .folder_repo
                    .find_by_id(parent_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Parent folder {parent_id} not found"))
                    })?;
                Some(parent.context()?)
            }
            None => None,
        };
        context::validate_child(req.context, parent_context)?;

        let folder = self
            .folder_repo
            .create(&CreateFolder {
                name: req.name,
                parent_folder_id: req.parent_folder_id,
                context: req.context,
            })
            .await?;

        info!(folder_id = %folder.id, name = %folder.name, "Created folder");
        Ok(folder)
    }

    /// Get a folder by id.
    pub async fn get_folder(&self, folder_id: Uuid) -> AppResult<Folder> {
        self.folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Direct subfolders of a folder.
    pub async fn list_subfolders(&self, folder_id: Uuid) -> AppResult<Vec<Folder>> {
        self.folder_repo.list_children(folder_id).await
    }

    /// Top-level folders of a workspace.
    pub async fn list_workspace_roots(&self, workspace_id: Uuid) -> AppResult<Vec<Folder>> {
        self.folder_repo.list_workspace_roots(workspace_id).await
    }

    /// Files directly inside a folder, paginated.
    pub async fn list_files(
        &self,
        folder_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        self.file_repo.list_by_folder(folder_id, page).await
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, folder_id: Uuid, name: &str) -> AppResult<Folder> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Folder name may not be empty"));
        }
        self.folder_repo.rename(folder_id, name).await
    }
}
