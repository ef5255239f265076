//! Filesystem collaborators: discovery, backups and deletion of originals.

mod backup;
mod prune;
mod walk;

pub use backup::{backup_files, backup_folder, FILES_BACKUP_PREFIX, FOLDER_BACKUP_PREFIX};
pub use prune::{delete_files, find_prunable, PruneFailure, PruneReport};
pub use walk::{find_documents, find_images, is_source_image};
