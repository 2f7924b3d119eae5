//! Verdura Core - Shared types library.
//!
//! This crate provides common types used across all Verdura components:
//! - `api` - REST backend for the grocery storefront
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`pricing`] - Order pricing rules (subtotal, tax, shipping, total)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use types::*;
