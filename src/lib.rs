// Model-Car Collection Manager - Core Library
// Exposes the record model, the generic container, and the file codecs
// for use in the menu driver and tests.

pub mod collection;
pub mod error;
pub mod files;
pub mod record;

// Re-export commonly used types
pub use collection::{handle, Collection, Handle};
pub use error::{CollectionError, FileError};
pub use files::{
    export_csv, import_csv, load_binary, read_binary, read_csv, save_binary, write_binary,
    write_csv, ImportReport, RowIssue, CSV_HEADER,
};
pub use record::{
    Car, CarProps, CarType, Condition, InstanceCounter, Record, MINT_CONDITION_BONUS,
    RARE_MULTIPLIER, VALUABLE_THRESHOLD,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
