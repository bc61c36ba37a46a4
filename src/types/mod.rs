// ABOUTME: Validated domain types for project identity.
// ABOUTME: Project names, DNS domains, and product editions.

mod domain;
mod edition;
mod project_name;

pub use domain::{Domain, DomainError};
pub use edition::Edition;
pub use project_name::{ProjectName, ProjectNameError};
