use std::{
    cell::RefCell,
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};

use super::{
    download::{DownloadProgress, Transport},
    error::Result,
    host::{Release, ReleaseAsset, Repository, RepositoryHost},
};

/// Writes a `.tar.gz` whose members are `(name, contents, mode)`. Names are
/// stored verbatim, so `../x` and `/x` members can be produced.
pub fn write_tar_gz(path: &Path, members: &[(&str, &[u8], u32)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents, mode) in members {
        let mut header = tar::Header::new_gnu();
        let raw = header.as_gnu_mut().unwrap();
        raw.name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder.append(&header, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn repository(name: &str) -> Repository {
    Repository {
        name: name.into(),
        full_name: format!("PhysiBoSS-Models/{name}"),
        html_url: format!("https://github.com/PhysiBoSS-Models/{name}"),
    }
}

pub fn asset(name: &str) -> ReleaseAsset {
    ReleaseAsset {
        name: name.into(),
        browser_download_url: format!("https://downloads.example/v1/{name}"),
        size: 0,
    }
}

/// In-memory organization: repository pages plus one release list per repo.
#[derive(Default)]
pub struct FakeHost {
    pub repository_pages: Vec<Vec<Repository>>,
    pub releases: HashMap<String, Vec<(Release, Vec<ReleaseAsset>)>>,
    pub requested_pages: RefCell<Vec<u32>>,
}

impl FakeHost {
    pub fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        Self {
            repository_pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(repository).collect())
                .collect(),
            ..Self::default()
        }
    }

    pub fn release(mut self, repo: &str, tag: &str, assets: &[&str]) -> Self {
        let release = Release {
            id: self.releases.values().map(Vec::len).sum::<usize>() as u64 + 1,
            tag_name: tag.into(),
            name: Some(tag.into()),
            assets_url: format!("https://api.example/{repo}/{tag}/assets"),
        };
        self.releases
            .entry(repo.to_string())
            .or_default()
            .push((release, assets.iter().map(|name| asset(name)).collect()));
        self
    }
}

impl RepositoryHost for FakeHost {
    fn list_repositories(&self, _organization: &str, page: u32) -> Result<Vec<Repository>> {
        self.requested_pages.borrow_mut().push(page);
        Ok(self
            .repository_pages
            .get(page as usize)
            .cloned()
            .unwrap_or_default())
    }

    fn list_releases(&self, repository: &Repository, page: u32) -> Result<Vec<Release>> {
        if page > 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .releases
            .get(&repository.name)
            .map(|releases| releases.iter().map(|(release, _)| release.clone()).collect())
            .unwrap_or_default())
    }

    fn list_assets(&self, release: &Release) -> Result<Vec<ReleaseAsset>> {
        Ok(self
            .releases
            .values()
            .flatten()
            .find(|(candidate, _)| candidate.id == release.id)
            .map(|(_, assets)| assets.clone())
            .unwrap_or_default())
    }
}

/// Serves every URL from one local file.
pub struct FileTransport {
    pub source: PathBuf,
    pub fetched: RefCell<Vec<String>>,
}

impl FileTransport {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for FileTransport {
    fn fetch_to_file(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64> {
        self.fetched.borrow_mut().push(url.to_string());
        let bytes = fs::copy(&self.source, destination)?;
        progress(DownloadProgress {
            downloaded: bytes,
            total: Some(bytes),
        });
        Ok(bytes)
    }
}

/// Serves one local file in fixed-size chunks without announcing its length,
/// like a response lacking `Content-Length`.
pub struct ChunkedTransport {
    pub source: PathBuf,
    pub chunk: usize,
}

impl Transport for ChunkedTransport {
    fn fetch_to_file(
        &self,
        _url: &str,
        destination: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64> {
        let bytes = fs::read(&self.source)?;
        let mut file = File::create(destination)?;
        let mut downloaded = 0u64;
        for chunk in bytes.chunks(self.chunk) {
            file.write_all(chunk)?;
            downloaded += chunk.len() as u64;
            progress(DownloadProgress {
                downloaded,
                total: None,
            });
        }
        Ok(downloaded)
    }
}
