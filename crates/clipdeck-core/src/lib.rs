//! Types shared by the clipdeck feature crates

mod error;

pub use error::{ErrorBody, HttpError, OkStatus};
