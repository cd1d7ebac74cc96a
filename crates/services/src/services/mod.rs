pub mod bootstrap;
pub mod config;
pub mod events;
pub mod forge;
pub mod label_sync;
pub mod state_mapper;
pub mod task_service;
pub mod webhook;
pub mod workflow_rules;
