//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the batch/unit workflow operations.
//! - Keep shell and UI layers decoupled from storage details.

pub mod lote_service;
