//! Row types for every table iso-collate reads or writes.
//!
//! Each input file kind gets a fixed-shape record deserialized by column
//! name; columns not listed here are ignored. `TsvRecord` ties a record
//! to the column it is keyed by, so the loader can check the header
//! before reading any row.

use config::{CCS_SUFFIX, NA};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub trait TsvRecord: DeserializeOwned {
    /// header column whose value keys the record
    const KEY: &'static str;
    /// every header column the record needs, key included
    const REQUIRED: &'static [&'static str];

    fn key(&self) -> String;
}

/// lima report row, one per ZMW
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BarcodeRecord {
    #[serde(rename = "ZMW")]
    pub zmw: String,
    #[serde(rename = "IdxFirstNamed")]
    pub idx_first_named: String,
    #[serde(rename = "IdxCombinedNamed")]
    pub idx_combined_named: String,
    pub extra: String,
}

impl BarcodeRecord {
    /// anything but the literal NA counts as extra bases
    pub fn has_extra_bases(&self) -> bool {
        self.extra != NA
    }
}

impl TsvRecord for BarcodeRecord {
    const KEY: &'static str = "ZMW";
    const REQUIRED: &'static [&'static str] =
        &["ZMW", "IdxFirstNamed", "IdxCombinedNamed", "extra"];

    fn key(&self) -> String {
        format!("{}{}", self.zmw, CCS_SUFFIX)
    }
}

/// SQANTI classification row, one per isoform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassificationRecord {
    pub isoform: String,
    pub length: String,
    pub structural_category: String,
    pub associated_transcript: String,
    pub associated_gene: String,
}

impl TsvRecord for ClassificationRecord {
    const KEY: &'static str = "isoform";
    const REQUIRED: &'static [&'static str] = &[
        "isoform",
        "length",
        "structural_category",
        "associated_transcript",
        "associated_gene",
    ];

    fn key(&self) -> String {
        self.isoform.clone()
    }
}

/// on-target row; `read_id` holds the isoform id despite its name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OnTargetRecord {
    pub read_id: String,
    pub genes: String,
}

impl OnTargetRecord {
    pub fn is_on_target(&self) -> bool {
        !self.genes.is_empty()
    }
}

impl TsvRecord for OnTargetRecord {
    const KEY: &'static str = "read_id";
    const REQUIRED: &'static [&'static str] = &["read_id", "genes"];

    fn key(&self) -> String {
        self.read_id.clone()
    }
}

/// one collated report row, borrowing from the loaded tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord<'a> {
    pub id: &'a str,
    pub pbid: &'a str,
    pub length: &'a str,
    pub transcript: &'a str,
    pub gene: &'a str,
    pub category: &'a str,
    pub ontarget: &'a str,
    #[serde(rename = "ORFgroup")]
    pub orf_group: &'a str,
    #[serde(rename = "BC_1")]
    pub bc_1: &'a str,
    #[serde(rename = "BC_2")]
    pub bc_2: &'a str,
}

impl<'a> OutputRecord<'a> {
    pub fn new(
        read_id: &'a str,
        isoform_id: &'a str,
        class: &'a ClassificationRecord,
        barcode: &'a BarcodeRecord,
        ontarget: &'a str,
        orf_group: &'a str,
    ) -> Self {
        Self {
            id: read_id,
            pbid: isoform_id,
            length: &class.length,
            transcript: &class.associated_transcript,
            gene: &class.associated_gene,
            category: &class.structural_category,
            ontarget,
            orf_group,
            bc_1: &barcode.idx_first_named,
            bc_2: &barcode.idx_combined_named,
        }
    }
}
