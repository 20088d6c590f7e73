use clap::{ArgAction, Parser};
use config::{with_suffix, ArgCheck, ORF_FASTA_SUFFIX, ORF_GROUP_SUFFIX};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(version, about = "Collate reads, isoforms, barcodes and annotations", long_about = None)]
pub struct Args {
    #[arg(
        required = true,
        value_name = "GROUP",
        help = "Collapse .group.txt [isoform -> comma-separated reads]"
    )]
    pub group_filename: PathBuf,

    #[arg(
        required = true,
        value_name = "BC",
        help = "lima report .trimmed.lima.report"
    )]
    pub bc_filename: PathBuf,

    #[arg(
        required = true,
        value_name = "CLASS",
        help = "SQANTI classification.txt"
    )]
    pub class_filename: PathBuf,

    #[arg(required = true, value_name = "OUTPUT", help = "Output filename")]
    pub output_filename: PathBuf,

    #[arg(
        short = 'i',
        long = "ontarget_filename",
        required = false,
        value_name = "PATH",
        help = "(Optional) on target information text"
    )]
    pub ontarget_filename: Option<PathBuf>,

    #[arg(
        short = 'p',
        long = "dedup_ORF_prefix",
        required = false,
        value_name = "PREFIX",
        help = "(Optional) dedup-ed ORF group prefix, must have <pre>.faa and <pre>.group.txt"
    )]
    pub dedup_orf_prefix: Option<PathBuf>,

    #[arg(
        long = "no-extra-base",
        help = "Drop all reads where there are extra bases",
        action = ArgAction::SetTrue
    )]
    pub no_extra_base: bool,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    /// `<prefix>.group.txt`, the only ORF-dedup file that is read
    pub fn orf_group_filename(&self) -> Option<PathBuf> {
        self.dedup_orf_prefix
            .as_ref()
            .map(|prefix| with_suffix(prefix, ORF_GROUP_SUFFIX))
    }

    pub fn orf_fasta_filename(&self) -> Option<PathBuf> {
        self.dedup_orf_prefix
            .as_ref()
            .map(|prefix| with_suffix(prefix, ORF_FASTA_SUFFIX))
    }
}

impl ArgCheck for Args {
    fn get_output(&self) -> &Path {
        &self.output_filename
    }

    fn get_inputs(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("Group file", self.group_filename.clone()),
            ("CSV file", self.bc_filename.clone()),
            ("Class file", self.class_filename.clone()),
        ]
    }

    fn get_optionals(&self) -> Vec<(&'static str, PathBuf)> {
        let mut optionals = Vec::new();

        if let Some(ontarget) = &self.ontarget_filename {
            optionals.push(("Ontarget file", ontarget.clone()));
        }
        if let (Some(group), Some(fasta)) = (self.orf_group_filename(), self.orf_fasta_filename()) {
            optionals.push(("Dedup group file", group));
            optionals.push(("Dedup ORF file", fasta));
        }

        optionals
    }
}
