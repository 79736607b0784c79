//! Fieldpin — a headless map-location-picking engine.
//!
//! Drives the open → pan → resolve → confirm/cancel lifecycle of a
//! "choose location on a map" interaction: permission handling, device
//! positioning, debounced reverse geocoding with stale-response guards,
//! and the confirmation hand-off.

pub mod cache;
pub mod picker;
pub mod providers;
