//! Atelier Storage Library
//!
//! Everything that moves image bytes in or out of the process: loading edit
//! inputs, naming and organizing output files, resolving filename conflicts,
//! persisting remote or inline images with size and retry guards, and pruning
//! old output.
//!
//! # Output layout
//!
//! Files land in `{base}/{subdir?}/{filename}` where `subdir` is chosen by the
//! organize-by mode (`YYYY-MM-DD`, aspect-ratio label or quality label) and
//! `filename` by the naming strategy. User-supplied components never contain
//! `..` or path separators.

pub mod cleanup;
pub mod conflict;
pub mod formats;
pub mod loader;
pub mod naming;
pub mod organizer;
pub mod persister;
pub mod retry;

// Re-export commonly used types
pub use cleanup::cleanup_old_files;
pub use conflict::resolve_conflict;
pub use loader::{ImageInputLoader, LoadedImage};
pub use naming::{NamingContext, NamingEngine};
pub use organizer::{ensure_directory, resolve_directory, DirectoryContext};
pub use persister::{FilePersister, ImageSource, SaveContext};
pub use retry::{Backoff, RetryPolicy};
