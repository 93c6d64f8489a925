//! Entry point discovery in a loaded module

use crate::toolchain::{MethodInfo, TypeInfo, TypeRef};

/// Conventional name of a script entry method
pub const ENTRY_METHOD: &str = "Main";

/// The method a script run will invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub type_name: String,
    pub method: String,
    /// Whether the method takes the `string[]` argument vector
    pub takes_args: bool,
    /// Whether the declared return type is `int`
    pub returns_int: bool,
}

fn qualifies(method: &MethodInfo) -> bool {
    method.name == ENTRY_METHOD
        && method.is_public
        && method.is_static
        && match method.parameters.as_slice() {
            [] => true,
            [only] => *only == TypeRef::StringArray,
            _ => false,
        }
}

/// Pick the entry point among a module's exported types.
///
/// Only class types are considered. Types are visited in lexical order of
/// their names so the choice does not depend on how the loader enumerates
/// them; within a type the first qualifying method wins.
pub fn find_entry_point(types: &[TypeInfo]) -> Option<EntryPoint> {
    let mut classes: Vec<&TypeInfo> = types.iter().filter(|t| t.is_class).collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    classes.into_iter().find_map(|ty| {
        ty.methods.iter().find(|m| qualifies(m)).map(|m| EntryPoint {
            type_name: ty.name.clone(),
            method: m.name.clone(),
            takes_args: !m.parameters.is_empty(),
            returns_int: m.return_type == TypeRef::Int32,
        })
    })
}
