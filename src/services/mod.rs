// Services module - Scan workflow and backend access

pub mod backend;
pub mod geolocation;
pub mod qr_generator;
pub mod scan_history;
pub mod scan_presenter;
pub mod scan_session;
pub mod scan_verifier;
pub mod sticker_service;
