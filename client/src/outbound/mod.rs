//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! The [`supabase`] adapters speak the hosted backend's auth and table APIs
//! over reqwest. Adapters are thin translators between domain types and wire
//! representations. They contain no business logic.

pub mod supabase;
