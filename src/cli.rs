use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cluster::{ClusterConfig, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_QUESTIONS_PER_CLUSTER};
use crate::export::{DEFAULT_TO_DIVIDE, ReportOptions, TextMarkup};

#[derive(Parser, Debug)]
#[command(
    name = "quizdoc",
    version,
    about = "Turn annotated quiz documents into quiz-import XML and text reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Convert(ConvertArgs),
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Keep `<vowel>'` sequences instead of restoring the accented vowel.
    #[arg(long, default_value_t = false)]
    pub no_accent_repair: bool,

    #[arg(long, default_value_t = DEFAULT_QUESTIONS_PER_CLUSTER)]
    pub questions_per_cluster: usize,

    #[arg(long, default_value_t = DEFAULT_MIN_CLUSTER_SIZE)]
    pub cluster_min_size: usize,
}

impl Default for PipelineArgs {
    fn default() -> Self {
        Self {
            no_accent_repair: false,
            questions_per_cluster: DEFAULT_QUESTIONS_PER_CLUSTER,
            cluster_min_size: DEFAULT_MIN_CLUSTER_SIZE,
        }
    }
}

impl PipelineArgs {
    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            questions_per_cluster: self.questions_per_cluster,
            min_cluster_size: self.cluster_min_size,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Documents or directories of documents (.docx, .txt).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, default_value = "generated")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub ordered: bool,

    #[arg(long, default_value_t = false)]
    pub separated: bool,

    #[arg(long, default_value_t = DEFAULT_TO_DIVIDE)]
    pub to_divide: usize,

    #[arg(long, default_value_t = false)]
    pub emit_json: bool,

    /// Keep inline HTML in prompts and answers instead of escaping it.
    #[arg(long, default_value_t = false)]
    pub raw_html: bool,

    #[arg(long)]
    pub schema: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl ConvertArgs {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            ordered: self.ordered,
            separated: self.separated,
            to_divide: self.to_divide,
        }
    }

    pub fn text_markup(&self) -> TextMarkup {
        if self.raw_html {
            TextMarkup::Raw
        } else {
            TextMarkup::Escaped
        }
    }

    /// Clusters are only rendered at the boundaries of an ordered,
    /// separated report.
    pub fn needs_clusters(&self) -> bool {
        self.ordered && self.separated
    }
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}
