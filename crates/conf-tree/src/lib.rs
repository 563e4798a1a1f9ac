//! Path-addressed configuration tree.
//!
//! A [`ConfigTree`] holds [`Value`] nodes addressed by `:`-delimited keys
//! and folds other trees into itself with a deep merge that only recurses
//! where both sides are maps. Lists and opaque instances are always
//! replaced wholesale.

mod merge;
mod path;
mod tree;
mod value;

pub use merge::{deep_merge, merge_layers, merge_maps};
pub use path::{KeyPath, PathError, DELIMITER, ENV_SEPARATOR, KEY_SEPARATOR};
pub use tree::ConfigTree;
pub use value::{Map, Opaque, OpaqueValue, Value};
