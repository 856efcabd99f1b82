mod payload;
mod request;
mod source;

pub use payload::PayloadKind;
pub use request::{host_is_64bit, InstallRequest};
pub use source::{source_key, PackageSource};

#[cfg(test)]
mod tests;
