//! Shared fixtures for the integration suites: an in-memory database with
//! the full schema, and payload builders.

#![allow(dead_code)]

use bidanku_core::services::{AncPayload, ImunisasiPayload, KbPayload, PersalinanPayload};
use bidanku_core::{db, AuditLog, PatientInput, SqlitePool};
use chrono::NaiveDate;

pub async fn pool() -> SqlitePool {
    db::connect_in_memory().await.expect("in-memory database")
}

pub fn audit(pool: &SqlitePool) -> AuditLog {
    AuditLog::new(pool.clone())
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query")
}

pub fn patient_input(nama: &str, nik: Option<&str>) -> PatientInput {
    PatientInput {
        nama: nama.into(),
        nik: nik.map(String::from),
        umur: Some(27),
        alamat: Some("Jl. Melati No. 3".into()),
        telepon: Some("081234567890".into()),
    }
}

pub fn anc_payload(nama: &str, nik: Option<&str>) -> AncPayload {
    AncPayload {
        pasien: patient_input(nama, nik),
        tanggal: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        hpht: NaiveDate::from_ymd_opt(2025, 12, 1),
        hpl: NaiveDate::from_ymd_opt(2026, 9, 7),
        nama_suami: Some("Budi".into()),
        telepon_suami: None,
        hasil_pemeriksaan: Some("TD 110/70, DJJ 140x/menit".into()),
    }
}

pub fn kb_payload(nama: &str, nik: Option<&str>) -> KbPayload {
    KbPayload {
        pasien: patient_input(nama, nik),
        tanggal: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
        metode: "suntik 3 bulan".into(),
        tanggal_kontrol: NaiveDate::from_ymd_opt(2026, 6, 12),
        keluhan: None,
    }
}

pub fn imunisasi_payload(nama: &str, jenis: &str) -> ImunisasiPayload {
    ImunisasiPayload {
        pasien: patient_input(nama, None),
        tanggal: NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(),
        jenis_imunisasi: jenis.into(),
        berat_badan: Some(4.1),
        tinggi_badan: Some(54.0),
        jadwal_selanjutnya: None,
    }
}

pub fn persalinan_payload(nama: &str, nik: Option<&str>) -> PersalinanPayload {
    PersalinanPayload {
        pasien: patient_input(nama, nik),
        tanggal: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        jenis_persalinan: "normal".into(),
        penolong: Some("Bidan Ratna".into()),
        berat_bayi: Some(3100.0),
        panjang_bayi: Some(49.0),
        jam_mulai: None,
        jam_selesai: Some("10:45:00".into()),
    }
}
