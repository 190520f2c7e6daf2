//! Prism Core
//!
//! Core library for managing QuickSight resources: attribute values, schemas,
//! permission deltas, and the diff/plan/apply pipeline that treats side effects
//! as values.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod permission;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
