//! Application layer - dependency-aware package operations.

mod resolver;

pub use resolver::{Change, Outcome, Outdated, Report, Resolver, Role};
