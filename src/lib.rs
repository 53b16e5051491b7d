// College Finder - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod catalog;
pub mod college;
pub mod config;
pub mod documents;
pub mod error;
pub mod identity;
pub mod import;
pub mod locations;
pub mod logging;
pub mod validation;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use catalog::{
    apply, filter, search, sort, sort_by_rank, Catalog, CatalogQuery, Facets, Filters, SortOrder,
};
pub use college::{seed_colleges, CollegeRecord, CollegeType};
pub use config::{load_config, AppConfig};
pub use documents::{
    format_file_size, BlobStore, DocumentRecord, DocumentService, FsBlobStore, MemoryBlobStore,
};
pub use error::{AuthError, ConfigError, DocumentError, FieldError, ImportError, StorageError};
pub use identity::{
    Identity, IdentityProvider, InMemoryIdentityProvider, Profile, Session, SessionEvent,
};
pub use import::{
    detect_source, import_delimited, import_json, load_catalog, source_for_path, DelimitedSource,
    ImportReport, JsonSource, RecordSource, SeedSource, SourceKind,
};
pub use locations::{group_by_location, LocationGroup};
pub use logging::{init_tracing, LogFormat};
pub use validation::{validate_neet_mark, validate_neet_rank};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
