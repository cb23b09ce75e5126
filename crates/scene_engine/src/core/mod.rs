//! # Core Engine Module
//!
//! Shared configuration for every subsystem of the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for logging, importing and rendering

pub mod config;

pub use config::{
    ApplicationConfig,
    Config,
    ConfigError,
    EngineConfig,
    ImportConfig,
    RendererConfig,
};
