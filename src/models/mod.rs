mod catalog;
mod download;
mod error;
mod host;
mod metadata;
mod platform;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{is_model_name, DownloadOptions, DownloadOutcome, ModelCatalog};
pub use download::{
    backup_project_files, mark_executable, plan_for, DownloadPlan, DownloadProgress, HttpTransport,
    Transport,
};
pub use error::{Error, Result};
pub use host::{
    GithubClient, GithubConfig, Release, ReleaseAsset, Repository, RepositoryHost,
    DEFAULT_API_BASE_URL, DEFAULT_PER_PAGE,
};
pub use metadata::{compute_sha256, ActiveModel, DESCRIPTOR_FILE};
pub use platform::{host_platform, AssetPlatform};
