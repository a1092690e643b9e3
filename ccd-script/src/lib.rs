pub mod naming;
pub mod split;

pub use naming::{
    LUA_EXTENSION, file_name_component, sanitize_unit_name, script_file_name, unit_file_name,
};
pub use split::{ScriptUnit, split_functions};
