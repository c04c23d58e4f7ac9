//! Convalida - Grade Conversion & Transfer Engine
//!
//! Interprets academic grades captured under one national grading system
//! (AR, US, UK, DE), normalizes them onto a common 0-100 scale, converts
//! them into any other system through versioned band tables, and
//! simulates/executes bulk transfers of a student's record between
//! institutions.
//!
//! ## Pipeline
//! Native value -> normalize (0-100) -> band lookup -> denormalize.
//! No system-to-system conversion skips the normalized intermediate.
//!
//! ## Quick Start
//!
//! ```rust
//! use convalida::conversion::ConversionEngine;
//! use convalida::models::{ArGrade, GradeSystem, NativeValue};
//!
//! let engine = ConversionEngine::with_defaults();
//! let grade = NativeValue::Ar(ArGrade { nota: 8.0, instancia: None });
//! let outcome = engine
//!     .convert(GradeSystem::Ar, GradeSystem::Us, &grade)
//!     .unwrap();
//! assert_eq!(outcome.normalized.get(), 80.0);
//! ```

// Core error handling
pub mod error;

// Domain models: systems, native shapes, normalized scale, transfer types
pub mod models;

// Normalize/denormalize, rule tables and the conversion engine
pub mod conversion;

// Declared subject equivalences and their resolution
pub mod equivalence;

// Transfer simulation and execution
pub mod transfer;

// In-memory implementations of the store boundaries
pub mod stores;

// REST API surface
pub mod api;
