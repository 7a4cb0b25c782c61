//! Versioned Config
//!
//! Persists tool configuration as versioned, schema-validated documents and
//! upgrades older on-disk versions before any caller reads them.
//!
//! ## Features
//!
//! - **Dense Versions**: every kind carries schemas `v0..=latest` with no gaps
//! - **Structural Validation**: JSON Schema checks on every version, no coercion
//! - **Migration Chains**: one step per version boundary, always walked in order
//! - **Self-Healing Loads**: migrated documents are written back to disk
//! - **Multi-Format Storage**: YAML, JSON and TOML files
//!
//! ## Load flow
//!
//! ```text
//! read bytes ─► parse ─► validate(vN) ─► step N→N+1 ─► validate(vN+1) ─► … ─► validate(latest)
//!                                                                                │
//!                                       persist if changed ◄─────────────────────┘
//!                                                │
//!                                     ReadonlyConfig / Config
//! ```

pub mod checksum;
pub mod codec;
pub mod error;
pub mod fs;
pub mod kind;
pub mod kinds;
pub mod migration;
pub mod paths;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod store;
pub mod validator;
pub mod version;

pub use checksum::Checksum;
pub use codec::Format;
pub use error::{ConfigError, Corruption, Result};
pub use fs::{ConfigFs, LocalFs};
pub use kind::{ConfigKind, ConfigKindBuilder};
pub use migration::{MigrationChain, MigrationError, MigrationStep};
pub use paths::{ConfigLocation, DirsResolver, PathResolver};
pub use registry::SchemaRegistry;
pub use schema::Schema;
pub use settings::StoreSettings;
pub use store::{Config, ConfigMeta, ConfigStore, ReadonlyConfig};
pub use validator::{ValidationError, Violation};
pub use version::SchemaVersion;
