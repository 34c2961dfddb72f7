//! Per-service descriptors for the shared registration protocol.
//!
//! Each module defines one payload type, one detail-row type and a unit
//! struct implementing [`crate::registration::ClinicalService`]. The actual
//! write/read/lifecycle logic lives in [`crate::registration`].

pub mod anc;
pub mod imunisasi;
pub mod kb;
pub mod kunjungan;
pub mod persalinan;

pub use anc::{Anc, AncDetail, AncPayload};
pub use imunisasi::{Imunisasi, ImunisasiDetail, ImunisasiPayload};
pub use kb::{Kb, KbDetail, KbPayload};
pub use kunjungan::{Kunjungan, KunjunganDetail, KunjunganPayload};
pub use persalinan::{Persalinan, PersalinanDetail, PersalinanPayload};

use crate::registration::RegistrationService;

/// Convenience aliases for the five instantiations of the generic service.
pub type AncService = RegistrationService<Anc>;
pub type KbService = RegistrationService<Kb>;
pub type ImunisasiService = RegistrationService<Imunisasi>;
pub type PersalinanService = RegistrationService<Persalinan>;
pub type KunjunganService = RegistrationService<Kunjungan>;
