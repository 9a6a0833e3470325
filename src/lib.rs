//! Discovery and installation of PhysiBoSS models published as GitHub
//! releases.
//!
//! A [`ModelCatalog`] enumerates the model repositories of an organization
//! once, resolves the release asset built for the running platform and
//! unpacks it into a directory. The caller owns an [`ActiveModel`] that ends
//! up pointing at the unpacked `model.yml`.

pub mod config;
pub mod models;

pub use config::Settings;
pub use models::{
    ActiveModel, DownloadOptions, DownloadOutcome, DownloadProgress, Error, GithubClient,
    ModelCatalog, RepositoryHost, Result, Transport,
};
