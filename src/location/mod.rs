//! Best-effort geolocation with a persisted freshness cache.

pub mod geocode;
pub mod manager;
pub mod models;
pub mod notify;
pub mod source;

pub use geocode::{NominatimGeocoder, ReverseGeocoder};
pub use manager::{LocationManager, LocationSettings, WatchHandle};
pub use models::{
    CachedLocation, Coordinates, LocationNotice, LocationOutcome, LocationSource,
    PermissionState, PersistedLocation, Place, Position, PositionOptions, UNKNOWN_CITY,
};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use source::{FixedPositionSource, IpPositionSource, PositionSource};
