use super::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPlatform {
    MacOs,
    Windows,
    Linux,
}

impl AssetPlatform {
    /// Maps a host platform string such as `Linux`, `Darwin` or
    /// `MINGW64_NT-10.0` to the release flavour built for it.
    pub fn from_host(platform: &str) -> Result<Self> {
        let lowered = platform.to_lowercase();
        if lowered.contains("darwin") {
            Ok(AssetPlatform::MacOs)
        } else if ["win", "msys_nt", "mingw64_nt"]
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            Ok(AssetPlatform::Windows)
        } else if lowered.starts_with("linux") {
            Ok(AssetPlatform::Linux)
        } else {
            Err(Error::UnsupportedPlatform {
                platform: platform.to_string(),
            })
        }
    }

    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            AssetPlatform::MacOs => "-macos.tar.gz",
            AssetPlatform::Windows => "-win.tar.gz",
            AssetPlatform::Linux => "-linux.tar.gz",
        }
    }

    #[must_use]
    pub fn matches(&self, asset_name: &str) -> bool {
        asset_name.ends_with(self.suffix())
    }
}

/// Platform string of the running host, spelled the way `uname` does.
#[must_use]
pub fn host_platform() -> String {
    match std::env::consts::OS {
        "macos" => "Darwin".into(),
        "windows" => "Windows".into(),
        "linux" => "Linux".into(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_hosts() {
        let cases = [
            ("Darwin", AssetPlatform::MacOs),
            ("darwin22.1", AssetPlatform::MacOs),
            ("Windows", AssetPlatform::Windows),
            ("MSYS_NT-10.0-19045", AssetPlatform::Windows),
            ("MINGW64_NT-10.0", AssetPlatform::Windows),
            ("Linux", AssetPlatform::Linux),
        ];
        for (host, expected) in cases {
            assert_eq!(AssetPlatform::from_host(host).unwrap(), expected, "{host}");
        }
    }

    #[test]
    fn rejects_unknown_hosts() {
        let error = AssetPlatform::from_host("plan9").unwrap_err();
        assert!(matches!(error, Error::UnsupportedPlatform { platform } if platform == "plan9"));
        assert!(AssetPlatform::from_host("FreeBSD").is_err());
    }

    #[test]
    fn suffix_matching_is_exact() {
        assert!(AssetPlatform::Linux.matches("Foo-linux.tar.gz"));
        assert!(!AssetPlatform::Linux.matches("Foo-linux.tar.gz.sha256"));
        assert!(!AssetPlatform::MacOs.matches("Foo-win.tar.gz"));
    }

    #[test]
    fn host_platform_is_resolvable_on_supported_targets() {
        if cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
            assert!(AssetPlatform::from_host(&host_platform()).is_ok());
        }
    }
}
