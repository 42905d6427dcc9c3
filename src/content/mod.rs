//! Content transformation: storage-markup scanning and the composite
//! read-modify-write operations built on top of the primitive API.

pub mod engine;
pub mod fetch;
pub mod storage;

pub use engine::{ContentEngine, EmbedOptions, UploadSource};
pub use fetch::{FetchedFile, HttpRemoteFiles, RemoteFiles};
pub use storage::{MacroSpan, Position};
