use std::sync::Arc;

use cmtypes::CompilationUnit;
use log::debug;

use crate::utils::conf::CmtConfig;

/// State shared by every builder, descriptor and store of one compilation
/// session.
pub struct ScriptContext {
    /// Static types and named classes minted so far.
    pub unit: CompilationUnit,

    /// Configuration the context was created with.
    pub config: CmtConfig,
}

impl ScriptContext {
    pub fn create(config: CmtConfig) -> Arc<Self> {
        debug!(
            "Creating script context (root namespace {}, mangle prefix {}).",
            config.root_namespace, config.mangle_prefix
        );

        Arc::new(ScriptContext {
            unit: config.compilation_unit(),
            config,
        })
    }

    pub fn with_default_config() -> Arc<Self> {
        Self::create(CmtConfig::default())
    }
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptContext")
            .field("types", &self.unit.types.len())
            .field("classes", &self.unit.classes.len())
            .field("config", &self.config)
            .finish()
    }
}
