//! Records mirrored from the managed backend.
//!
//! # Responsibility
//! - Define the row shapes of `profiles`, `contacts`, `resources` and
//!   `saved_resources` plus the authenticated identity.
//! - Provide advisory client-side validation for user input.
//!
//! # Invariants
//! - The backend owns the canonical lifecycle of every record; these types
//!   only mirror confirmed server state.

pub mod contact;
pub mod identity;
pub mod profile;
pub mod resource;
pub mod validation;
