use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verdict a reviewer can assign to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReviewOutcome {
    Benar,
    Salah,
}

impl ReviewOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Benar => "Benar",
            ReviewOutcome::Salah => "Salah",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Benar" => Some(ReviewOutcome::Benar),
            "Salah" => Some(ReviewOutcome::Salah),
            _ => None,
        }
    }
}

/// A product listing under audit. Ids are assigned sequentially at import and
/// are only stable within one import generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: u64,
    pub kategori_lv1: String,
    pub kategori_lv2: String,
    pub kategori_lv3: String,
    pub nama_produk: String,
    pub url_produk: String,
    pub url_image: String,
    /// Upstream inspection verdict: "Sesuai", "Tidak Sesuai", or empty when
    /// the inspector has not gotten to the row yet. Read-only here.
    pub hasil_pemeriksaan: String,
    pub reviewer: String,
    pub pemeriksa: String,
    pub hasil_review: Option<ReviewOutcome>,
    pub reviewed: bool,
}

impl ProductRecord {
    /// Records without an inspection verdict are invisible to every
    /// reviewer-facing listing and counter.
    pub fn has_inspection(&self) -> bool {
        !self.hasil_pemeriksaan.trim().is_empty()
    }
}

/// Reviewer-scoped counters over inspected records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub reviewed: usize,
    pub belum_review: usize,
    pub benar: usize,
    pub salah: usize,
}
