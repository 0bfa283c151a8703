//! Tree structure, composition and the frozen registry

pub mod node;
pub mod registry;
pub mod spec;

pub use node::{DecisionNode, TreeDefinition};
pub use registry::{RegistryBuilder, TreeRegistry};
pub use spec::{NodeSpec, TreeSpec};
