// Models module - Backend projections and local records

pub mod geolocation;
pub mod role;
pub mod scan_attempt;
pub mod sticker;
pub mod vehicle;

pub use geolocation::GeoLocation;
pub use role::{capabilities_for, Capabilities, Role};
pub use scan_attempt::ScanAttempt;
pub use sticker::{Sticker, StickerState};
pub use vehicle::{Compliance, ComplianceStatus, Vehicle, VerifiedScan};
