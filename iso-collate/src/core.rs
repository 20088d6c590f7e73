//! Core module for collating reads with their isoform annotations
//! Alejandro Gonzales-Irribarren, 2025
//!
//! This module contains the join that turns a collapse group file
//! into a per-read report.
//!
//! In short, every read listed in the group file is looked up in the
//! SQANTI classification (through its isoform) and in the lima barcode
//! report. Reads missing from either table, or carrying extra bases when
//! those are not wanted, are dropped with a warning. Retained reads are
//! enriched with the optional on-target status and ORF-dedup group and
//! written as a tab-separated table with a fixed header.

use anyhow::{Context, Result};
use log::{info, warn};

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use config::{
    get_progress_bar, CCS_SUFFIX, NA, NO_ORF, OFF_TARGET, ON_TARGET, OUTPUT_FIELDS, TSV_DELIMITER,
};

use crate::cli::Args;
use crate::record::{BarcodeRecord, ClassificationRecord, OnTargetRecord, OutputRecord};
use crate::utils::{read_group_info, read_records, CollateError, GroupMapping, RecordMapping};

/// Read-only lookup tables the join draws from
#[derive(Debug, Default)]
pub struct Annotations {
    pub barcodes: RecordMapping<BarcodeRecord>,
    pub classification: RecordMapping<ClassificationRecord>,
    pub ontarget: Option<RecordMapping<OnTargetRecord>>,
    pub orf_groups: Option<GroupMapping>,
}

impl Annotations {
    pub fn load(args: &Args) -> Result<Self, CollateError> {
        let barcodes = read_records::<BarcodeRecord, _>(&args.bc_filename)?;
        let classification = read_records::<ClassificationRecord, _>(&args.class_filename)?;

        let ontarget = args
            .ontarget_filename
            .as_ref()
            .map(read_records::<OnTargetRecord, _>)
            .transpose()?;

        let orf_groups = args
            .orf_group_filename()
            .map(read_group_info)
            .transpose()?;

        Ok(Self {
            barcodes,
            classification,
            ontarget,
            orf_groups,
        })
    }

    /// Exact `<read>` lookup first; `<movie>/<zmw>/ccs` reads fall back to
    /// `<zmw>/ccs` for reports that store bare hole numbers.
    pub fn barcode(&self, read_id: &str) -> Option<&BarcodeRecord> {
        self.barcodes.get(read_id).or_else(|| {
            let (_, hole) = read_id.strip_suffix(CCS_SUFFIX)?.rsplit_once('/')?;
            self.barcodes.get(&format!("{}{}", hole, CCS_SUFFIX))
        })
    }

    /// `NA` without an on-target table, else `Y`/`N`; an isoform missing
    /// from a supplied table is fatal
    pub fn ontarget_status(&self, isoform_id: &str) -> Result<&'static str, CollateError> {
        match &self.ontarget {
            None => Ok(NA),
            Some(ontarget) => match ontarget.get(isoform_id) {
                Some(record) if record.is_on_target() => Ok(ON_TARGET),
                Some(_) => Ok(OFF_TARGET),
                None => Err(CollateError::Lookup(isoform_id.to_string())),
            },
        }
    }

    pub fn orf_group(&self, isoform_id: &str) -> &str {
        match &self.orf_groups {
            None => NA,
            Some(groups) => groups.get(isoform_id).map_or(NO_ORF, String::as_str),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollateStats {
    pub kept: usize,
    pub unclassified: usize,
    pub unbarcoded: usize,
    pub extra_bases: usize,
}

impl CollateStats {
    pub fn dropped(&self) -> usize {
        self.unclassified + self.unbarcoded + self.extra_bases
    }
}

/// Joins every (read, isoform) pair in `groups` against `annotations`.
///
/// Output order follows `groups`. Skipped reads are logged and counted;
/// only an on-target lookup failure aborts.
pub fn collate<'a>(
    groups: &'a GroupMapping,
    annotations: &'a Annotations,
    no_extra_base: bool,
) -> Result<(Vec<OutputRecord<'a>>, CollateStats), CollateError> {
    let mut records = Vec::with_capacity(groups.len());
    let mut stats = CollateStats::default();

    let pb = get_progress_bar(groups.len() as u64, "Collating reads...");

    for (read_id, isoform_id) in groups {
        pb.inc(1);

        let Some(class) = annotations.classification.get(isoform_id) else {
            warn!(
                "ignoring ID {} since it is not in the classification file",
                isoform_id
            );
            stats.unclassified += 1;
            continue;
        };

        let Some(barcode) = annotations.barcode(read_id) else {
            warn!(
                "ignoring ZMW {} since it is not in the lima bc dedup file",
                read_id
            );
            stats.unbarcoded += 1;
            continue;
        };

        if no_extra_base && barcode.has_extra_bases() {
            warn!(
                "ignoring ID {} [read {}] since it has extra bases",
                isoform_id, read_id
            );
            stats.extra_bases += 1;
            continue;
        }

        let ontarget = annotations.ontarget_status(isoform_id)?;
        let orf_group = annotations.orf_group(isoform_id);

        records.push(OutputRecord::new(
            read_id, isoform_id, class, barcode, ontarget, orf_group,
        ));
        stats.kept += 1;
    }

    pb.finish_and_clear();

    Ok((records, stats))
}

/// Writes the header and rows; fails if `path` already exists
pub fn write_records<P: AsRef<Path>>(path: P, records: &[OutputRecord]) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("ERROR: could not create output file {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(TSV_DELIMITER)
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    writer.write_record(OUTPUT_FIELDS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Rows written to {}: {}", path.display(), records.len());

    Ok(())
}

pub fn collate_isoforms(args: Args) -> Result<PathBuf> {
    info!("INFO: collating isoforms with args: {:?}", &args);

    let groups = read_group_info(&args.group_filename)?;
    let annotations = Annotations::load(&args)?;

    let (records, stats) = collate(&groups, &annotations, args.no_extra_base)?;
    info!(
        "Reads kept: {}, dropped: {} [unclassified: {}, no barcode: {}, extra bases: {}]",
        stats.kept,
        stats.dropped(),
        stats.unclassified,
        stats.unbarcoded,
        stats.extra_bases
    );

    write_records(&args.output_filename, &records)?;

    Ok(args.output_filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: &str = "PB.1.1\tm1/10/ccs,m1/20/ccs\n";
    const BC: &str = "ZMW\tIdxFirstNamed\tIdxCombinedNamed\textra\n10\tF1\tC1\tNA\n20\tF2\tC2\tYES\n";
    const CLASS: &str = "isoform\tlength\tstructural_category\tassociated_transcript\tassociated_gene\n\
                         PB.1.1\t500\tfull-splice_match\tENST001\tGENE1\n";

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn args(dir: &Path) -> Args {
        Args {
            group_filename: write(dir, "collapsed.group.txt", GROUP),
            bc_filename: write(dir, "lima.report", BC),
            class_filename: write(dir, "classification.txt", CLASS),
            output_filename: dir.join("collated.tsv"),
            ontarget_filename: None,
            dedup_orf_prefix: None,
            no_extra_base: false,
        }
    }

    fn rows(path: &Path) -> Vec<Vec<String>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| line.split('\t').map(String::from).collect())
            .collect()
    }

    fn classification(isoforms: &[&str]) -> RecordMapping<ClassificationRecord> {
        isoforms
            .iter()
            .map(|iso| {
                (
                    iso.to_string(),
                    ClassificationRecord {
                        isoform: iso.to_string(),
                        length: "100".into(),
                        structural_category: "novel_in_catalog".into(),
                        associated_transcript: "novel".into(),
                        associated_gene: "GENE".into(),
                    },
                )
            })
            .collect()
    }

    fn barcodes(entries: &[(&str, &str)]) -> RecordMapping<BarcodeRecord> {
        entries
            .iter()
            .map(|(zmw, extra)| {
                let record = BarcodeRecord {
                    zmw: zmw.to_string(),
                    idx_first_named: format!("F_{zmw}"),
                    idx_combined_named: format!("C_{zmw}"),
                    extra: extra.to_string(),
                };
                (format!("{zmw}/ccs"), record)
            })
            .collect()
    }

    fn groups(pairs: &[(&str, &str)]) -> GroupMapping {
        pairs
            .iter()
            .map(|(read, iso)| (read.to_string(), iso.to_string()))
            .collect()
    }

    #[test]
    fn test_end_to_end_keeps_both_reads() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());

        let output = collate_isoforms(args).unwrap();
        let rows = rows(&output);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], OUTPUT_FIELDS.to_vec());
        assert_eq!(
            rows[1],
            vec![
                "m1/10/ccs",
                "PB.1.1",
                "500",
                "ENST001",
                "GENE1",
                "full-splice_match",
                "NA",
                "NA",
                "F1",
                "C1"
            ]
        );
        assert_eq!(rows[2][0], "m1/20/ccs");
        assert_eq!((rows[2][8].as_str(), rows[2][9].as_str()), ("F2", "C2"));
    }

    #[test]
    fn test_end_to_end_rows_resolve_through_zmw_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());

        let groups = read_group_info(&args.group_filename).unwrap();
        let annotations = Annotations::load(&args).unwrap();
        let (records, stats) = collate(&groups, &annotations, false).unwrap();

        assert_eq!(stats.kept, 2);
        for record in &records {
            assert!(annotations.classification.contains_key(record.pbid));
            assert!(annotations.barcode(record.id).is_some());
            assert!(!annotations.barcodes.contains_key(record.id));
        }
    }

    #[test]
    fn test_end_to_end_no_extra_base_drops_flagged_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.no_extra_base = true;

        let output = collate_isoforms(args).unwrap();
        let rows = rows(&output);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "m1/10/ccs");
    }

    #[test]
    fn test_end_to_end_with_ontarget_and_orf_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.group_filename = write(
            dir.path(),
            "collapsed.group.txt",
            "PB.1.1\tm1/10/ccs\nPB.2.1\tm1/20/ccs\n",
        );
        args.class_filename = write(
            dir.path(),
            "classification.txt",
            "isoform\tlength\tstructural_category\tassociated_transcript\tassociated_gene\n\
             PB.1.1\t500\tfull-splice_match\tENST001\tGENE1\n\
             PB.2.1\t800\tincomplete-splice_match\tENST002\tGENE2\n",
        );
        args.ontarget_filename = Some(write(
            dir.path(),
            "ontarget.txt",
            "read_id\tgenes\nPB.1.1\tGENE1\nPB.2.1\t\n",
        ));
        write(dir.path(), "dedup.group.txt", "ORFgroup_PB.1_1\tPB.1.1\n");
        write(dir.path(), "dedup.faa", ">ORFgroup_PB.1_1\nMAAA\n");
        args.dedup_orf_prefix = Some(dir.path().join("dedup"));

        let output = collate_isoforms(args).unwrap();
        let rows = rows(&output);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[1][6].as_str(), rows[1][7].as_str()), ("Y", "ORFgroup_PB.1_1"));
        assert_eq!((rows[2][6].as_str(), rows[2][7].as_str()), ("N", "NoORF"));
    }

    #[test]
    fn test_ontarget_lookup_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.ontarget_filename = Some(write(
            dir.path(),
            "ontarget.txt",
            "read_id\tgenes\nPB.9.9\tGENE9\n",
        ));
        let output = args.output_filename.clone();

        let err = collate_isoforms(args).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CollateError>(),
            Some(CollateError::Lookup(iso)) if iso == "PB.1.1"
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_write_records_refuses_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = write(dir.path(), "collated.tsv", "previous run\n");

        assert!(write_records(&output, &[]).is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run\n");
    }

    #[test]
    fn test_write_records_header_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("collated.tsv");

        write_records(&output, &[]).unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "id\tpbid\tlength\ttranscript\tgene\tcategory\tontarget\tORFgroup\tBC_1\tBC_2\n"
        );
    }

    #[test]
    fn test_collate_skips_unclassified_and_unbarcoded() {
        let groups = groups(&[
            ("m1/1/ccs", "PB.1.1"),
            ("m1/2/ccs", "PB.404"),
            ("m1/3/ccs", "PB.1.1"),
        ]);
        let annotations = Annotations {
            barcodes: barcodes(&[("m1/1", "NA"), ("m1/2", "NA")]),
            classification: classification(&["PB.1.1"]),
            ..Default::default()
        };

        let (records, stats) = collate(&groups, &annotations, false).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "m1/1/ccs");
        assert_eq!(
            stats,
            CollateStats {
                kept: 1,
                unclassified: 1,
                unbarcoded: 1,
                extra_bases: 0
            }
        );
        for record in &records {
            assert!(annotations.classification.contains_key(record.pbid));
            assert!(annotations.barcode(record.id).is_some());
        }
    }

    #[test]
    fn test_collate_extra_base_filter_only_when_enabled() {
        let groups = groups(&[("m1/1/ccs", "PB.1.1"), ("m1/2/ccs", "PB.1.1")]);
        let annotations = Annotations {
            barcodes: barcodes(&[("m1/1", "NA"), ("m1/2", "AC")]),
            classification: classification(&["PB.1.1"]),
            ..Default::default()
        };

        let (records, _) = collate(&groups, &annotations, false).unwrap();
        assert_eq!(records.len(), 2);

        let (records, stats) = collate(&groups, &annotations, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "m1/1/ccs");
        assert_eq!(stats.extra_bases, 1);
        for record in &records {
            assert!(!annotations.barcodes[record.id].has_extra_bases());
        }
    }

    #[test]
    fn test_collate_follows_group_order() {
        let groups = groups(&[
            ("m1/3/ccs", "PB.1.1"),
            ("m1/1/ccs", "PB.2.1"),
            ("m1/2/ccs", "PB.1.1"),
        ]);
        let annotations = Annotations {
            barcodes: barcodes(&[("m1/1", "NA"), ("m1/2", "NA"), ("m1/3", "NA")]),
            classification: classification(&["PB.1.1", "PB.2.1"]),
            ..Default::default()
        };

        let (records, _) = collate(&groups, &annotations, false).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id).collect();

        assert_eq!(ids, vec!["m1/3/ccs", "m1/1/ccs", "m1/2/ccs"]);
    }

    #[test]
    fn test_ontarget_status_values() {
        let mut annotations = Annotations::default();
        assert_eq!(annotations.ontarget_status("PB.1.1").unwrap(), "NA");

        annotations.ontarget = Some(
            [
                ("PB.1.1", "GENE1"),
                ("PB.2.1", ""),
            ]
            .iter()
            .map(|(iso, genes)| {
                (
                    iso.to_string(),
                    OnTargetRecord {
                        read_id: iso.to_string(),
                        genes: genes.to_string(),
                    },
                )
            })
            .collect(),
        );

        assert_eq!(annotations.ontarget_status("PB.1.1").unwrap(), "Y");
        assert_eq!(annotations.ontarget_status("PB.2.1").unwrap(), "N");
        assert!(matches!(
            annotations.ontarget_status("PB.3.1"),
            Err(CollateError::Lookup(_))
        ));
    }

    #[test]
    fn test_orf_group_values() {
        let mut annotations = Annotations::default();
        assert_eq!(annotations.orf_group("PB.1.2"), "NA");

        annotations.orf_groups = Some(groups(&[("PB.1.2", "ORFgroup_PB.1_1")]));
        assert_eq!(annotations.orf_group("PB.1.2"), "ORFgroup_PB.1_1");
        assert_eq!(annotations.orf_group("PB.7.1"), "NoORF");
    }

    #[test]
    fn test_barcode_lookup_prefers_exact_key() {
        let annotations = Annotations {
            barcodes: barcodes(&[("m1/10", "NA"), ("10", "YES")]),
            ..Default::default()
        };

        assert_eq!(annotations.barcode("m1/10/ccs").unwrap().extra, "NA");
        assert_eq!(annotations.barcode("m2/10/ccs").unwrap().extra, "YES");
        assert!(annotations.barcode("m1/11/ccs").is_none());
        assert!(annotations.barcode("m1/10").is_none());
    }
}
