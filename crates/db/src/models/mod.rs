pub mod column;
pub mod entity_link;
pub mod integration;
pub mod label;
pub mod project;
pub mod task;
pub mod workflow_rule;
