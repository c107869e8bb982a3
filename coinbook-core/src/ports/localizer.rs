//! Localizer port
//!
//! Resolves message keys plus positional arguments to display strings. The
//! row projector depends only on this trait, so tests can plug in a fixed
//! catalog instead of a full localization subsystem.

/// Message resolution trait
pub trait Localizer: Send + Sync {
    /// Resolve `key` with positional `args` (`{0}`, `{1}`, ...)
    ///
    /// Must not fail: an unknown key resolves to something displayable.
    fn resolve(&self, key: &str, args: &[&str]) -> String;
}

impl<L: Localizer + ?Sized> Localizer for &L {
    fn resolve(&self, key: &str, args: &[&str]) -> String {
        (**self).resolve(key, args)
    }
}

impl<L: Localizer + ?Sized> Localizer for std::sync::Arc<L> {
    fn resolve(&self, key: &str, args: &[&str]) -> String {
        (**self).resolve(key, args)
    }
}
