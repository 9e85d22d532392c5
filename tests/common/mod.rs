#![allow(dead_code)]

pub mod discovery_backend;
pub mod tracing;
