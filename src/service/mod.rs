pub mod error;
pub mod resolution;

pub use error::{ServiceError, ServiceResult};
pub use resolution::{CreateShortUrl, CreatedShortUrl, ResolutionService};
