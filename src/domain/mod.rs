pub mod diagnostic;
pub mod node;
pub mod replication;

pub use node::Node;
