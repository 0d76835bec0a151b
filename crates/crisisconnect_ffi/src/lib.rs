//! Flutter-facing bindings over `crisisconnect_core`.

pub mod api;
