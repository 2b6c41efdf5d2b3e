pub mod domain;
pub mod error;

pub use domain::{Collection, EntityType, Item, ParseEntityTypeError, ResourceKey};
pub use error::FetchError;

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
