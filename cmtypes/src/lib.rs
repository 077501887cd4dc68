//! Static type graph for concrete module types.
//!
//! [`types::TypeRegistry`] interns structural types, [`class::ClassRegistry`]
//! owns the named classes minted for module instances, and
//! [`unit::CompilationUnit`] bundles both.

pub mod class;
pub mod name;
pub mod types;
pub mod unit;
pub mod utils;

pub use class::{ClassAttribute, ClassRegistry, ClassType};
pub use name::QualifiedName;
pub use types::{AnyType, TypeRegistry, Typeref};
pub use unit::CompilationUnit;
