//!Library and CLI for extracting translatable text from Minecraft world exports and re-injecting translations.

mod constants;
mod functions;
mod statics;
pub use functions::{decode_legacy_name, is_candidate, read_to_string_without_bom};

pub mod archive;
pub mod cache;
pub mod generic;
pub mod json;
pub mod nbt;
pub mod package;
pub mod processors;
pub mod read;
pub mod region;
pub mod types;
pub mod world;
pub mod write;

pub use read::{Reader, ReaderBuilder};
pub use types::*;
pub use write::{WriteResults, Writer, WriterBuilder};
