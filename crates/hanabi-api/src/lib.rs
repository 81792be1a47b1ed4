pub mod anilist;
pub mod error;
pub mod resolver;
pub mod traits;

pub use error::ApiError;
