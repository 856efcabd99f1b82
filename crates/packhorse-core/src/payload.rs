use std::path::Path;

/// Payload classes the install step dispatches on. Classification is by file
/// extension only; content sniffing is the download service's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Msi,
    Msu,
    SelfExtracting,
    Zip,
    TarGz,
    SevenZip,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Msi => "msi",
            Self::Msu => "msu",
            Self::SelfExtracting => "exe",
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::SevenZip => "7z",
        }
    }

    pub fn classify(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            return Some(Self::TarGz);
        }

        match file_name.rsplit('.').next() {
            Some("msi") => Some(Self::Msi),
            Some("msu") => Some(Self::Msu),
            Some("exe") => Some(Self::SelfExtracting),
            Some("zip") => Some(Self::Zip),
            Some("7z") => Some(Self::SevenZip),
            _ => None,
        }
    }

    pub fn is_archive(self) -> bool {
        matches!(self, Self::Zip | Self::TarGz | Self::SevenZip)
    }

    pub fn is_native_installer(self) -> bool {
        matches!(self, Self::Msi | Self::Msu)
    }
}
