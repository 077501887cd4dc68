use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::{name::QualifiedName, types::Typeref};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs, Error)]
pub enum Error {
    /// A qualified name was empty or contained an empty atom.
    #[error("`{name}` is not a valid qualified name. Atoms must be non-empty and must not contain `.`.")]
    InvalidQualifiedName { name: String },

    /// A class is already registered under this name.
    #[error(
        "A class named `{name}` is already registered in the compilation unit. Request a mangled name before registering."
    )]
    ClassAlreadyRegistered { name: QualifiedName },

    /// A class already has a member with this name.
    #[error("Class `{class}` already has an attribute named `{attribute}`.")]
    DuplicateClassAttribute {
        class: QualifiedName,
        attribute: String,
    },

    /// The typeref does not belong to this registry.
    #[error("The type {0:?} is not present in the type registry.")]
    UnknownTyperef(Typeref),
}

pub type Result<T> = std::result::Result<T, Error>;
