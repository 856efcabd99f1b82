/// A named, located feed packages may be fetched from.
///
/// `is_registered` distinguishes sources persisted by the user from the
/// built-in default the registry synthesizes when no user sources exist;
/// the default is never written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    pub name: String,
    pub location: String,
    pub trusted: bool,
    pub is_registered: bool,
    pub is_validated: bool,
}

/// Identity key for a source name. Source names compare case-insensitively.
pub fn source_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
