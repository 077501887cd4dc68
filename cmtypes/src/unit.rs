use std::sync::Arc;

use crate::{
    class::{ClassRegistry, ClassType},
    name::QualifiedName,
    types::{AnyType, TypeRegistry, Typeref},
    utils::Result,
};

/// Everything the compiler knows about static types: the structural type
/// registry and the named classes.
pub struct CompilationUnit {
    pub types: TypeRegistry,
    pub classes: ClassRegistry,
}

impl CompilationUnit {
    pub fn new(node_id: [u8; 6], mangle_prefix: impl Into<String>) -> Self {
        Self {
            types: TypeRegistry::new(node_id),
            classes: ClassRegistry::new(mangle_prefix),
        }
    }

    /// Create and register a module class named `name`, and intern its class
    /// type. `name` must be free; see [`ClassRegistry::mangle`].
    pub fn create_module_class(&self, name: QualifiedName) -> Result<(Arc<ClassType>, Typeref)> {
        let class = Arc::new(ClassType::new(name, true));
        let typeref = self.register_module_class(class.clone())?;
        Ok((class, typeref))
    }

    /// Register a finished class and intern its class type. Nothing is
    /// registered when the name is taken.
    pub fn register_module_class(&self, class: Arc<ClassType>) -> Result<Typeref> {
        self.classes.register_type(class.clone())?;
        Ok(self.class_typeref(&class))
    }

    /// The interned [`Typeref`] of `class`.
    pub fn class_typeref(&self, class: &ClassType) -> Typeref {
        self.types
            .search_or_insert(AnyType::Class(class.class_ref().clone()))
    }
}
