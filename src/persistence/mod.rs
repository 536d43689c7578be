//! Disk cache for GPU textures: dumping, replacement lookup and the
//! bookkeeping shared with the reload watcher

pub mod export;
pub mod export_queue;
pub mod import;
pub mod naming;
pub mod registry;

pub use export::{ExportEncoder, ExportJob};
pub use export_queue::ExportQueue;
pub use import::{ImportScanner, ImportedTexture};
pub use naming::{content_hash, parse_file_name, ParsedFileName, TextureName};
pub use registry::{Registry, WriteStamp};
