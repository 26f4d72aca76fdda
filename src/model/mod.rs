pub mod binder;
pub mod data_core;
pub mod data_node;
pub mod node_index;
pub mod performance;
pub mod shadow_tree;
