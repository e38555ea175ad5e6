//! Use-case services over repositories.

pub mod task_service;
