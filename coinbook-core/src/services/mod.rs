//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod currency;
mod demo;
pub mod export;
pub mod logging;
pub mod migration;
pub mod projector;
mod wallet;

pub use currency::{CurrencyConverter, RateSnapshot};
pub use demo::DemoService;
pub use export::{ColumnJoiner, CsvStrategy, ExportOptions, LineEnding, OverwritePolicy, TabularExporter};
pub use logging::{EntryPoint, EventKind, ExportStats, LogEntry, LogEvent, LogFilter, LogSummary, LoggingService, Prune};
pub use migration::{MigrationResult, MigrationService};
pub use projector::RowProjector;
pub use wallet::WalletService;
