//! Nominal types
//!
//! Types whose identity is a name rather than a structure: functions,
//! declared interfaces and classes. Two function types or two interfaces with
//! the same name and signature are the same type; a class is identified by
//! the UUID it was minted with, so two classes sharing a name (before
//! mangling) never alias.
use uuid::Uuid;

use crate::name::QualifiedName;

/// Type of a free function bound as a module attribute.
///
/// Functions are not first-class values of the static type system. The type
/// only records which function it designates.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FunctionType {
    pub name: QualifiedName,
}

impl std::fmt::Display for FunctionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Function[{}]", self.name)
    }
}

/// A declared interface.
///
/// When `is_module` is set the interface describes a module slot: any module
/// implementing the listed methods can be stored under it.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterfaceType {
    pub name: QualifiedName,
    pub is_module: bool,
    /// Method names, sorted.
    pub methods: Vec<String>,
}

impl InterfaceType {
    pub fn new(
        name: QualifiedName,
        is_module: bool,
        methods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut methods: Vec<String> = methods.into_iter().map(Into::into).collect();
        methods.sort();
        methods.dedup();
        Self {
            name,
            is_module,
            methods,
        }
    }
}

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_module {
            write!(f, "ModuleInterface[{}]", self.name)
        } else {
            write!(f, "Interface[{}]", self.name)
        }
    }
}

/// Reference to a class registered in a `ClassRegistry`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassRef {
    pub id: Uuid,
    pub name: QualifiedName,
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
