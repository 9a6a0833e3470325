use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::{
    download::{
        backup_project_files, mark_executable, plan_for, unpack, DownloadProgress, HttpTransport,
        Transport,
    },
    error::{Error, Result},
    host::{GithubClient, Repository, RepositoryHost},
    metadata::{compute_sha256, ActiveModel, DESCRIPTOR_FILE},
    platform::{host_platform, AssetPlatform},
};

/// Model repositories are the ones whose name starts with an uppercase letter.
#[must_use]
pub fn is_model_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub backup: bool,
    /// Directory holding the project files to back up; the current
    /// directory when unset.
    pub backup_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub url: String,
    pub checksum: String,
    pub bytes_downloaded: u64,
    pub entries: Vec<String>,
    pub binary: PathBuf,
    pub backups: Vec<PathBuf>,
    pub descriptor: PathBuf,
}

pub struct ModelCatalog<H, T> {
    host: H,
    transport: T,
    organization: String,
    platform: String,
    models: BTreeMap<String, Repository>,
}

impl ModelCatalog<GithubClient, HttpTransport> {
    /// Catalog over a GitHub organization, sharing one HTTP client between
    /// the API calls and the asset downloads.
    pub fn github(github: GithubClient, organization: &str) -> Result<Self> {
        let transport = HttpTransport::with_client(github.client().clone());
        Self::new(github, transport, organization)
    }
}

impl<H, T> ModelCatalog<H, T>
where
    H: RepositoryHost,
    T: Transport,
{
    pub fn new(host: H, transport: T, organization: &str) -> Result<Self> {
        let models = enumerate_models(&host, organization)?;
        info!(organization, models = models.len(), "loaded model catalog");
        Ok(Self {
            host,
            transport,
            organization: organization.to_string(),
            platform: host_platform(),
            models,
        })
    }

    /// Resolves assets as if running on `platform` instead of this host.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Model names in ascending order.
    pub fn list_models(&self) -> impl Iterator<Item = &str> {
        self.models().map(|(name, _)| name)
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &Repository)> {
        self.models
            .iter()
            .map(|(name, repository)| (name.as_str(), repository))
    }

    pub fn get_model(&self, name: &str) -> Result<&Repository> {
        self.models.get(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
    }

    /// URL of the asset built for this platform in the model's latest
    /// release. "Latest" is whatever the host lists first.
    pub fn resolve_asset_url(&self, name: &str) -> Result<String> {
        let repository = self.get_model(name)?;
        let release = self
            .host
            .list_releases(repository, 0)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoRelease {
                model: name.to_string(),
            })?;
        let assets = self.host.list_assets(&release)?;

        let platform = AssetPlatform::from_host(&self.platform)?;
        let mut matching: Vec<_> = assets
            .into_iter()
            .filter(|asset| platform.matches(&asset.name))
            .collect();

        match matching.len() {
            0 => Err(Error::NoAsset {
                model: name.to_string(),
                suffix: platform.suffix().to_string(),
            }),
            1 => {
                let asset = matching.remove(0);
                debug!(
                    model = name,
                    release = release.name.as_deref().unwrap_or(&release.tag_name),
                    tag = %release.tag_name,
                    asset = %asset.name,
                    size = asset.size,
                    "resolved release asset"
                );
                Ok(asset.browser_download_url)
            }
            _ => Err(Error::AmbiguousAsset {
                model: name.to_string(),
                suffix: platform.suffix().to_string(),
                candidates: matching.into_iter().map(|asset| asset.name).collect(),
            }),
        }
    }

    pub fn download_model(
        &self,
        name: &str,
        target_dir: &Path,
        options: &DownloadOptions,
        active: &mut ActiveModel,
    ) -> Result<DownloadOutcome> {
        self.download_model_with_progress(name, target_dir, options, active, |_| {})
    }

    /// Fetches the model's archive into `target_dir`, unpacks it there and
    /// makes `active` point at the unpacked descriptor. `active` is cleared
    /// first and stays cleared unless every step succeeds.
    pub fn download_model_with_progress<F>(
        &self,
        name: &str,
        target_dir: &Path,
        options: &DownloadOptions,
        active: &mut ActiveModel,
        mut progress: F,
    ) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadProgress),
    {
        active.clear();

        let url = self.resolve_asset_url(name)?;
        let plan = plan_for(&url, target_dir);
        fs::create_dir_all(&plan.target_dir)?;

        info!(model = name, %url, target = %target_dir.display(), "downloading model");
        let bytes_downloaded = self
            .transport
            .fetch_to_file(&plan.url, &plan.archive_path, &mut progress)?;
        let checksum = compute_sha256(&plan.archive_path)?;

        let backups = if options.backup {
            let root = match &options.backup_root {
                Some(root) => root.clone(),
                None => std::env::current_dir()?,
            };
            backup_project_files(&root)?
        } else {
            Vec::new()
        };
        if options.backup && backups.is_empty() {
            warn!("backup requested but no project files were found");
        }

        let unpacked = unpack(&plan)?;
        mark_executable(&unpacked.binary)?;

        let descriptor = target_dir.join(DESCRIPTOR_FILE);
        active.set_descriptor(descriptor.clone());
        active.load_info()?;

        Ok(DownloadOutcome {
            url,
            checksum,
            bytes_downloaded,
            entries: unpacked.entries,
            binary: unpacked.binary,
            backups,
            descriptor,
        })
    }
}

fn enumerate_models<H: RepositoryHost>(
    host: &H,
    organization: &str,
) -> Result<BTreeMap<String, Repository>> {
    let mut models = BTreeMap::new();
    let mut page = 0;
    loop {
        let repositories = host.list_repositories(organization, page)?;
        if repositories.is_empty() {
            break;
        }
        debug!(page, count = repositories.len(), "fetched repository page");
        for repository in repositories {
            if is_model_name(&repository.name) {
                models.insert(repository.name.clone(), repository);
            }
        }
        page += 1;
    }
    Ok(models)
}
