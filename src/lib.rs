#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{AppController, ModelRegistry, TaskIntelligence, TranscriptionService};
pub use domain::{
    DomainError, Priority, ResolvedTask, TaskIntent, TaskOverrides, TaskPatch, TaskRequest,
};
