//! Route modules, one per domain area. Each exposes a `router()` (or a
//! generic `router::<S>()` for the clinical services) nested under `/api`.

pub mod audit;
pub mod auth;
pub mod clinical;
pub mod jadwal;
pub mod laporan;
pub mod patients;
