//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The export
//! pipeline depends only on these traits, not on concrete implementations.

mod localizer;
mod wallet_loader;

pub use localizer::Localizer;
pub use wallet_loader::WalletLoader;
