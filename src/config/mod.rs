//! Crate configuration: compiled-in optional features and algorithm options.
//!
//! Optional capabilities are a fixed set of [`Features`] flags resolved once,
//! the first time [`Config::global`] is called. Nothing is probed lazily
//! afterwards.

pub mod options;
pub use options::{FloatCmp, GramSchmidtOptions, PodOptions};

use std::fmt;
use std::sync::OnceLock;

use bitflags::bitflags;

bitflags! {
    /// Optional capabilities compiled into this build.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Gram matrices are assembled row-parallel on the rayon pool.
        const RAYON = 1 << 0;
        /// Sparse CSR operators.
        const SPARSE = 1 << 1;
    }
}

/// Snapshot of the build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub version: &'static str,
    pub features: Features,
    /// Worker threads available to parallel kernels (1 without rayon).
    pub threads: usize,
}

impl Config {
    /// Resolve the configuration of the running build.
    pub fn detect() -> Self {
        let mut features = Features::SPARSE;
        if cfg!(feature = "rayon") {
            features |= Features::RAYON;
        }
        Self {
            version: env!("CARGO_PKG_VERSION"),
            features,
            threads: Self::thread_count(),
        }
    }

    #[cfg(feature = "rayon")]
    fn thread_count() -> usize {
        rayon::current_num_threads()
    }

    #[cfg(not(feature = "rayon"))]
    fn thread_count() -> usize {
        1
    }

    /// Process-wide configuration, detected on first access.
    pub fn global() -> &'static Config {
        static CONFIG: OnceLock<Config> = OnceLock::new();
        CONFIG.get_or_init(Config::detect)
    }

    pub fn has(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "morkit {}", self.version)?;
        for (name, flag) in Features::all().iter_names() {
            let status = if self.features.contains(flag) { "present" } else { "missing" };
            writeln!(f, "  {name:<8} {status}")?;
        }
        write!(f, "  threads  {}", self.threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_config_is_resolved_once() {
        let a = Config::global();
        let b = Config::global();
        assert!(std::ptr::eq(a, b));
        assert!(a.has(Features::SPARSE));
        assert_eq!(a.has(Features::RAYON), cfg!(feature = "rayon"));
        assert!(a.threads >= 1);
    }

    #[test]
    fn display_lists_every_feature() {
        let text = Config::detect().to_string();
        assert!(text.contains("RAYON"));
        assert!(text.contains("SPARSE"));
    }
}
