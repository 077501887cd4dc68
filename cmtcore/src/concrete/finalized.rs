use std::{fmt::Write as _, io::Write as _, sync::Arc};

use cmtypes::{ClassType, QualifiedName, Typeref};
use log::debug;

use crate::{
    concrete::{Attribute, ConcreteModuleTypeData, IterableModuleKind, ModuleSlot},
    context::ScriptContext,
    runtime::{self, DynValue},
    utils::error::CmtResult,
};

/// An immutable concrete module type and the static type minted for it.
///
/// Function attributes, constants, overloads and failed attributes are not
/// members of the static type. They are served by the `find_*` queries while
/// methods of the type are compiled.
#[derive(Debug)]
pub struct ConcreteModuleType {
    ctx: Arc<ScriptContext>,
    /// `None` for descriptors created from a module interface.
    data: Option<ConcreteModuleTypeData>,
    jit_type: Typeref,
    class_type: Option<Arc<ClassType>>,
}

/// The origin class name moved under the root namespace, unless it already
/// lives there.
fn rooted_class_name(ctx: &ScriptContext, origin_name: &str) -> CmtResult<QualifiedName> {
    let class_name: QualifiedName = origin_name.parse()?;
    let root: QualifiedName = ctx.config.root_namespace.parse()?;
    let atoms = class_name.atoms();
    if atoms.len() > root.atoms().len() && atoms.starts_with(root.atoms()) {
        return Ok(class_name);
    }
    Ok(QualifiedName::from_atoms(
        root.atoms().iter().chain(atoms).cloned(),
    )?)
}

/// Create and register the class backing `data`.
///
/// The class is named after the origin class under the root namespace, and
/// mangled when the name is taken. It is registered only once every member
/// was added, so a failed build leaves the registry untouched.
fn create_type_from_data(
    ctx: &ScriptContext,
    data: &ConcreteModuleTypeData,
) -> CmtResult<(Arc<ClassType>, Typeref)> {
    let mut class_name = rooted_class_name(ctx, &data.origin_class.qualified_name()?)?;

    let classes = &ctx.unit.classes;
    if classes.get_class(&class_name).is_some() {
        class_name = classes.mangle(&class_name);
    }

    let class = Arc::new(ClassType::new(class_name, true));
    for (name, attribute) in &data.attributes {
        class.add_attribute(name.as_str(), attribute.ty, attribute.is_param)?;
    }
    for info in &data.modules {
        class.add_attribute(info.name.as_str(), info.jit_type(), false)?;
    }

    let jit_type = ctx.unit.register_module_class(class.clone())?;
    debug!("Minted module class {} for a new concrete type.", class.name());
    Ok((class, jit_type))
}

impl ConcreteModuleType {
    pub(crate) fn from_data(
        ctx: Arc<ScriptContext>,
        data: ConcreteModuleTypeData,
    ) -> CmtResult<Arc<Self>> {
        let (class_type, jit_type) = create_type_from_data(&ctx, &data)?;
        let concrete = Arc::new(Self {
            ctx,
            data: Some(data),
            jit_type,
            class_type: Some(class_type),
        });

        if concrete.ctx.config.dump_on_build {
            debug!("{}", concrete.display());
        }
        Ok(concrete)
    }

    /// A descriptor standing for a module interface type. It has no facts and
    /// only equals descriptors of the same interface.
    ///
    /// # Panics
    /// If `interface` is not a module interface type.
    pub fn from_interface(ctx: Arc<ScriptContext>, interface: Typeref) -> Arc<Self> {
        assert!(
            ctx.unit.types.is_module_interface(interface),
            "expected a module interface type, got {}",
            ctx.unit.types.fmt(interface)
        );

        Arc::new(Self {
            ctx,
            data: None,
            jit_type: interface,
            class_type: None,
        })
    }

    pub(crate) fn data(&self) -> Option<&ConcreteModuleTypeData> {
        self.data.as_ref()
    }

    pub fn jit_type(&self) -> Typeref {
        self.jit_type
    }

    /// The minted class, `None` for interface descriptors.
    pub fn class_type(&self) -> Option<&Arc<ClassType>> {
        self.class_type.as_ref()
    }

    pub fn origin_class(&self) -> Option<&DynValue> {
        self.data.as_ref().map(|data| &data.origin_class)
    }

    pub fn iterable_module_kind(&self) -> IterableModuleKind {
        self.data
            .as_ref()
            .map(|data| data.iterable_kind)
            .unwrap_or_default()
    }

    pub fn is_poisoned(&self) -> bool {
        self.data.as_ref().is_some_and(|data| data.poisoned)
    }

    pub fn find_constant(&self, name: &str) -> Option<DynValue> {
        let _guard = runtime::lock();
        self.data
            .as_ref()?
            .constants
            .get(name)
            .map(|constant| constant.0.clone())
    }

    pub fn find_overloads(&self, name: &str) -> Option<&[String]> {
        self.data
            .as_ref()?
            .overloads
            .get(name)
            .map(|names| names.as_slice())
    }

    /// The function type bound under `name`.
    pub fn find_function_attribute(&self, name: &str) -> Option<Typeref> {
        self.data
            .as_ref()?
            .function_attributes
            .get(name)
            .map(|attribute| attribute.function)
    }

    pub fn find_failed_attribute(&self, name: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .failed_attributes
            .get(name)
            .map(String::as_str)
    }

    /// Concrete type of the submodule `name`. `None` when there is no such
    /// submodule or when the slot is a module interface.
    pub fn find_submodule_concrete_type(&self, name: &str) -> Option<Arc<ConcreteModuleType>> {
        self.data
            .as_ref()?
            .modules
            .iter()
            .find(|info| info.name == name)
            .and_then(|info| info.concrete_type().cloned())
    }

    /// Constants, by name.
    pub fn constants(&self) -> impl Iterator<Item = (&str, &DynValue)> {
        self.data
            .iter()
            .flat_map(|data| data.constants.iter())
            .map(|(name, constant)| (name.as_str(), &constant.0))
    }

    /// Attributes, by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, Attribute)> {
        self.data
            .iter()
            .flat_map(|data| data.attributes.iter())
            .map(|(name, attribute)| (name.as_str(), *attribute))
    }

    /// Submodules and their static types, in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = (&str, Typeref)> {
        self.data
            .iter()
            .flat_map(|data| data.modules.iter())
            .map(|info| (info.name.as_str(), info.jit_type()))
    }

    /// Equality used for type sharing. Descriptors minted for the same static
    /// type are equal without looking at their facts; poisoned descriptors are
    /// never equal.
    ///
    /// Poison is checked before the same-type shortcut, so a poisoned
    /// descriptor is not even equal to itself.
    pub fn equals(&self, other: &ConcreteModuleType) -> CmtResult<bool> {
        if self.is_poisoned() || other.is_poisoned() {
            return Ok(false);
        }
        if self.jit_type == other.jit_type {
            return Ok(true);
        }

        match (&self.data, &other.data) {
            (Some(lhs), Some(rhs)) => lhs.try_eq(rhs),
            _ => Ok(false),
        }
    }

    /// Human readable listing of every fact, for debugging.
    pub fn display(&self) -> String {
        let _guard = runtime::lock();
        let types = &self.ctx.unit.types;
        let mut out = String::new();

        let Some(data) = &self.data else {
            let _ = writeln!(out, "ConcreteModuleType for: {}", types.fmt(self.jit_type));
            return out;
        };

        let _ = writeln!(
            out,
            "ConcreteModuleType for: {}",
            data.origin_class.display_name()
        );

        let _ = writeln!(out, "Constants:");
        for (name, constant) in &data.constants {
            let _ = writeln!(out, "\t{}: {}", name, constant.0.repr());
        }

        let _ = writeln!(out, "\nAttributes:");
        for (name, attribute) in &data.attributes {
            let param = if attribute.is_param { " (parameter)" } else { "" };
            let _ = writeln!(out, "\t{}: {}{}", name, types.fmt(attribute.ty), param);
        }

        let _ = writeln!(out, "\nSubmodules:");
        for info in &data.modules {
            let kind = match info.slot {
                ModuleSlot::Concrete(_) => "",
                ModuleSlot::Interface(_) => " (interface)",
            };
            let _ = writeln!(out, "\t{}: {}{}", info.name, types.fmt(info.jit_type()), kind);
        }

        let _ = writeln!(out, "\nOverloads:");
        for (name, overloads) in &data.overloads {
            let _ = writeln!(out, "\t{}: [{}]", name, overloads.join(", "));
        }

        let _ = writeln!(out, "\nFunction attributes:");
        for (name, function) in &data.function_attributes {
            let _ = writeln!(out, "\t{}: {}", name, types.fmt(function.function));
        }

        let _ = writeln!(out, "\nFailed attributes:");
        for (name, reason) in &data.failed_attributes {
            let _ = writeln!(out, "\t{}: {}", name, reason);
        }

        let _ = writeln!(out, "\nIterable module kind: {}", data.iterable_kind);
        let _ = writeln!(out, "isPoisoned: {}", data.poisoned);
        let _ = writeln!(out, "jit type: {}", types.fmt(self.jit_type));
        out
    }

    /// Write [`Self::display`] to stderr. Write failures are ignored.
    pub fn dump(&self) {
        let listing = self.display();
        let _ = std::io::stderr().lock().write_all(listing.as_bytes());
    }
}
