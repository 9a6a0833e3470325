use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Component, Path, PathBuf},
};

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tar::Archive;
use tracing::{debug, info, warn};

use super::error::{Error, Result};

const CHUNK_SIZE: usize = 32 * 1024;

/// Files copied aside before a model is unpacked over an existing project,
/// as `(source relative to the backup root, backup name in the backup root)`.
const BACKUP_FILES: [(&str, &str); 3] = [
    ("Makefile", "Makefile-backup"),
    ("main.cpp", "main-backup.cpp"),
    ("config/PhysiCell_settings.xml", "PhysiCell_settings-backup.xml"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    #[must_use]
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => {
                Some((self.downloaded as f64 / total as f64).clamp(0.0, 1.0) as f32)
            }
            _ => None,
        }
    }
}

/// Blocking retrieve-to-file.
pub trait Transport {
    fn fetch_to_file(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn fetch_to_file(
        &self,
        url: &str,
        destination: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        let total = response.content_length();

        let mut file = File::create(destination)?;
        let mut downloaded = 0u64;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let read = response.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            downloaded += read as u64;
            progress(DownloadProgress { downloaded, total });
        }
        file.flush()?;
        Ok(downloaded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub url: String,
    pub target_dir: PathBuf,
    pub archive_path: PathBuf,
}

#[must_use]
pub fn plan_for(url: &str, target_dir: &Path) -> DownloadPlan {
    let filename = filename_from_uri(url).unwrap_or_else(|| "model.tar.gz".into());
    DownloadPlan {
        url: url.to_string(),
        target_dir: target_dir.to_path_buf(),
        archive_path: target_dir.join(filename),
    }
}

#[derive(Debug)]
pub struct Unpacked {
    pub entries: Vec<String>,
    pub binary: PathBuf,
}

/// Copies `Makefile`, `main.cpp` and `config/PhysiCell_settings.xml` aside.
/// Missing sources are skipped.
pub fn backup_project_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for (source, backup) in BACKUP_FILES {
        let source = root.join(source);
        if !source.is_file() {
            continue;
        }
        let backup = root.join(backup);
        fs::copy(&source, &backup)?;
        debug!(from = %source.display(), to = %backup.display(), "backed up project file");
        created.push(backup);
    }
    Ok(created)
}

/// Unpacks a gzip-compressed tarball into `plan.target_dir` and removes the
/// archive. The binary is the first extracted member whose name does not end
/// in `.dll`; members that would land outside the target are skipped.
pub fn unpack(plan: &DownloadPlan) -> Result<Unpacked> {
    let extraction = |source: io::Error| Error::Extraction {
        archive: plan.archive_path.clone(),
        source,
    };

    let extracted = extract_tar_gz(&plan.archive_path, &plan.target_dir).map_err(extraction)?;
    let binary = extracted
        .iter()
        .find(|(name, _)| !name.ends_with(".dll"))
        .map(|(_, relative)| plan.target_dir.join(relative))
        .ok_or_else(|| {
            extraction(io::Error::new(
                io::ErrorKind::InvalidData,
                "archive does not contain a model binary",
            ))
        })?;
    fs::remove_file(&plan.archive_path).map_err(extraction)?;

    let entries: Vec<String> = extracted.into_iter().map(|(name, _)| name).collect();
    info!(
        entries = entries.len(),
        binary = %binary.display(),
        "unpacked model archive"
    );
    Ok(Unpacked { entries, binary })
}

/// Extracts every member it can place under `destination` and returns
/// `(member name, path relative to destination)` for each of them.
fn extract_tar_gz(
    archive_path: &Path,
    destination: &Path,
) -> io::Result<Vec<(String, PathBuf)>> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let mut extracted = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let name = path.to_string_lossy().into_owned();
        let Some(relative) = contained_path(&path) else {
            warn!(member = %name, "skipping archive member outside the target directory");
            continue;
        };
        if !entry.unpack_in(destination)? {
            warn!(member = %name, "skipping archive member outside the target directory");
            continue;
        }
        extracted.push((name, relative));
    }
    Ok(extracted)
}

/// Where `tar` places a member under the unpack directory: root and `.`
/// components are dropped and any `..` rejects the member.
fn contained_path(path: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// Adds the owner-execute bit to `path`, leaving every other bit as it was.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o100);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn filename_from_uri(uri: &str) -> Option<String> {
    let last_segment = uri.split('/').last()?;
    let clean = last_segment.split('?').next()?.split('#').next()?.trim();
    if clean.is_empty() {
        None
    } else {
        Some(clean.to_string())
    }
}
