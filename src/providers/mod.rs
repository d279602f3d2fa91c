pub mod azdo;
mod branches;

pub use azdo::AzdoProvider;
pub use branches::{BranchCatalog, BranchInformation};
