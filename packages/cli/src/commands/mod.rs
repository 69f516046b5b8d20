pub mod replay;
pub mod tree;

pub use replay::{replay, ReplayArgs};
pub use tree::{tree, TreeArgs};
