/// Namespace prepended to class names that have no module prefix.
pub const DEFAULT_ROOT_NAMESPACE: &str = "__jit__";

/// Atom prefix used by the class registry when it has to mangle a name.
pub const DEFAULT_MANGLE_PREFIX: &str = "___jit_mangle_";

/// Node id used for the v6 UUIDs handed out by the type registry.
pub const DEFAULT_TYPE_NODE_ID: [u8; 6] = *b"cmtype";

/// Name of the environment variable containing the path to the configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/cmt/config.toml` or `$HOME/.config/cmt/config.toml`
///  (2) on Windows: `%APPDATA%\cmt\config.toml`
pub const ENV_CONFIG_PATH: &str = "CMT_CONFIG_PATH";
