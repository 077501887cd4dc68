//! Nominal class types and the class registry.
//!
//! A [`ClassType`] is the static type a module instance compiles against. It
//! is identified by a [`QualifiedName`] that is unique within a
//! [`ClassRegistry`]; when two unrelated types want the same name, the
//! registry hands out a mangled alternative via [`ClassRegistry::mangle`].
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::{
    name::QualifiedName,
    types::{Typeref, nominal::ClassRef},
    utils::{Error, Result},
};

/// A member slot of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassAttribute {
    pub name: String,
    pub ty: Typeref,
    pub is_parameter: bool,
}

/// A nominal class.
///
/// The member list is append-only: once an attribute is added it cannot be
/// removed or retyped.
#[derive(Debug)]
pub struct ClassType {
    class_ref: ClassRef,
    is_module: bool,
    attributes: RwLock<Vec<ClassAttribute>>,
}

impl ClassType {
    pub fn new(name: QualifiedName, is_module: bool) -> Self {
        Self {
            class_ref: ClassRef {
                id: Uuid::new_v4(),
                name,
            },
            is_module,
            attributes: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &QualifiedName {
        &self.class_ref.name
    }

    pub fn class_ref(&self) -> &ClassRef {
        &self.class_ref
    }

    pub fn is_module(&self) -> bool {
        self.is_module
    }

    /// Append a member. Fails if a member with the same name already exists.
    pub fn add_attribute(&self, name: impl Into<String>, ty: Typeref, is_parameter: bool) -> Result<()> {
        let name = name.into();
        let mut attributes = self.attributes.write();
        if attributes.iter().any(|a| a.name == name) {
            return Err(Error::DuplicateClassAttribute {
                class: self.class_ref.name.clone(),
                attribute: name,
            });
        }
        attributes.push(ClassAttribute {
            name,
            ty,
            is_parameter,
        });
        Ok(())
    }

    pub fn find_attribute(&self, name: &str) -> Option<ClassAttribute> {
        self.attributes.read().iter().find(|a| a.name == name).cloned()
    }

    /// Borrow the member list, in insertion order.
    pub fn attributes(&self) -> MappedRwLockReadGuard<'_, [ClassAttribute]> {
        RwLockReadGuard::map(self.attributes.read(), |attributes| attributes.as_slice())
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.read().len()
    }
}

/// Registry of named classes, unique by qualified name.
pub struct ClassRegistry {
    classes: RwLock<BTreeMap<QualifiedName, Arc<ClassType>>>,
    mangle_index: AtomicUsize,
    mangle_prefix: String,
}

impl ClassRegistry {
    /// Create an empty registry. Mangled names carry an atom of the form
    /// `<mangle_prefix><n>`.
    pub fn new(mangle_prefix: impl Into<String>) -> Self {
        Self {
            classes: Default::default(),
            mangle_index: AtomicUsize::new(0),
            mangle_prefix: mangle_prefix.into(),
        }
    }

    pub fn get_class(&self, name: &QualifiedName) -> Option<Arc<ClassType>> {
        self.classes.read().get(name).cloned()
    }

    /// Register `class` under its own name. An existing class is never
    /// replaced.
    pub fn register_type(&self, class: Arc<ClassType>) -> Result<()> {
        let mut classes = self.classes.write();
        if classes.contains_key(class.name()) {
            return Err(Error::ClassAlreadyRegistered {
                name: class.name().clone(),
            });
        }
        debug!("Registered class {} ({}).", class.name(), class.class_ref().id);
        classes.insert(class.name().clone(), class);
        Ok(())
    }

    /// Derive a name that is not registered yet.
    ///
    /// If `name` already carries a mangle atom, that atom is replaced with a
    /// fresh one; otherwise a mangle atom is inserted right before the
    /// basename.
    pub fn mangle(&self, name: &QualifiedName) -> QualifiedName {
        let existing = name
            .atoms()
            .iter()
            .position(|atom| atom.starts_with(&self.mangle_prefix));

        loop {
            let index = self.mangle_index.fetch_add(1, Ordering::Relaxed);
            let atom = format!("{}{}", self.mangle_prefix, index);
            let candidate = match existing {
                Some(position) => name.replace_atom(position, atom),
                None => name.insert_atom_before_name(atom),
            };

            if self.get_class(&candidate).is_none() {
                info!("Mangled class name {} into {}.", name, candidate);
                return candidate;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_never_overwrites() {
        let registry = ClassRegistry::new("___m_");
        let name: QualifiedName = "__jit__.M".parse().unwrap();
        let first = Arc::new(ClassType::new(name.clone(), true));
        registry.register_type(first.clone()).unwrap();

        let second = Arc::new(ClassType::new(name.clone(), true));
        let err = registry.register_type(second).unwrap_err();
        assert!(err.is_class_already_registered());
        assert!(Arc::ptr_eq(&registry.get_class(&name).unwrap(), &first));
    }

    #[test]
    fn mangle_inserts_then_replaces() {
        let registry = ClassRegistry::new("___m_");
        let name: QualifiedName = "__jit__.M".parse().unwrap();

        let mangled = registry.mangle(&name);
        assert_eq!(mangled.to_string(), "__jit__.___m_0.M");

        let remangled = registry.mangle(&mangled);
        assert_eq!(remangled.to_string(), "__jit__.___m_1.M");
    }

    #[test]
    fn mangle_skips_taken_names() {
        let registry = ClassRegistry::new("___m_");
        let taken: QualifiedName = "__jit__.___m_0.M".parse().unwrap();
        registry
            .register_type(Arc::new(ClassType::new(taken, true)))
            .unwrap();

        let name: QualifiedName = "__jit__.M".parse().unwrap();
        assert_eq!(registry.mangle(&name).to_string(), "__jit__.___m_1.M");
    }

    #[test]
    fn class_attributes_are_append_only() {
        let class = ClassType::new("__jit__.M".parse().unwrap(), true);
        let reg = crate::types::TypeRegistry::new([0; 6]);
        let int = reg.search_or_insert(crate::types::primary::PrimaryType::Int.into());

        class.add_attribute("weight", int, true).unwrap();
        assert!(class.add_attribute("weight", int, false).is_err());
        assert_eq!(class.num_attributes(), 1);
        assert!(class.find_attribute("weight").unwrap().is_parameter);
        assert!(class.find_attribute("bias").is_none());
        assert_eq!(class.attributes()[0].name, "weight");
    }
}
