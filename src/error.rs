use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not read manifest: {}", _0.display())]
    Manifest(#[error(not(source))] PathBuf),
    /// The manifest owner has neither a slug nor a title to derive one from.
    #[display("manifest owner needs a slug or a title")]
    MissingSlug,
    #[display("could not open storage root")]
    Storage,
    #[display("could not create HTTP client")]
    Fetch,
    #[display("batch rejected")]
    Batch,
    #[display("could not resolve storage path")]
    Resolve,
    #[display("could not write output")]
    Output,
}
