pub mod edit;
pub mod init;
pub mod tree;
pub mod validate;

pub use edit::{copy, delete, move_node, set, CopyArgs, DeleteArgs, MoveArgs, SetArgs};
pub use init::{init, InitArgs};
pub use tree::{tree, TreeArgs};
pub use validate::{validate, ValidateArgs};
