//! Input handling: encoding resolution, document loading, raw sheets.

mod encoding;
mod loader;
mod sheet;

pub use encoding::{EncodingResolver, ResolvedEncoding};
pub use loader::{DocumentLoader, LoaderConfig};
pub use sheet::{Sheet, SourceMetadata};
