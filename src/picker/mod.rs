//! The location-picking subsystem.
//!
//! Open flow: permission → device fix (→ cached last-known → default) → initial resolution
//! Pan flow:  region settle → 500ms debounce → reverse geocode → address update

pub mod address;
pub mod debounce;
pub mod resolver;
pub mod types;

pub use resolver::{
    LocationResolver, PickerConfig, PickerEvent, PickerHandle, DEBOUNCE_WINDOW,
};
pub use types::{
    ConfirmedLocation, Coordinate, MapRegion, PermissionState, PickerError, Remediation,
    ResolvedAddress, DEFAULT_COORDINATE,
};
