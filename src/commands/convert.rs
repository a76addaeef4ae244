use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info, warn};

use super::pipeline::{DocumentPipeline, discover_inputs};
use crate::cli::ConvertArgs;
use crate::export::{inspect_quiz_xml, module_xml_filename, render_module_xml, render_report};
use crate::model::{ConvertRunManifest, DocumentOutcome, QuizDocument};
use crate::source::document_name;
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_bytes,
    write_json_pretty,
};

const STATUS_CONVERTED: &str = "converted";
const STATUS_FAILED: &str = "failed";

pub fn run(args: ConvertArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir.join("manifests").join(format!(
            "convert_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let mut warnings = Vec::new();
    if let Some(schema) = &args.schema {
        warn!(schema = %schema.display(), "xml schema validation is not supported, skipping");
        warnings.push(format!(
            "schema validation against {} was skipped",
            schema.display()
        ));
    }

    let sources = discover_inputs(&args.inputs)?;
    ensure_directory(&args.output_dir)?;
    let pipeline = DocumentPipeline::new(&args.pipeline, args.needs_clusters())?;

    info!(
        run_id = %run_id,
        documents = sources.len(),
        output_dir = %args.output_dir.display(),
        "starting convert"
    );

    let mut taken_dirs = HashMap::new();
    let mut documents = Vec::with_capacity(sources.len());
    for source in &sources {
        let dir_name = unique_dir_name(&mut taken_dirs, &document_name(source));
        documents.push(convert_document(&pipeline, source, &dir_name, &args));
    }

    let failed_count = documents
        .iter()
        .filter(|outcome| outcome.status == STATUS_FAILED)
        .count();

    let manifest = ConvertRunManifest {
        manifest_version: 1,
        run_id,
        status: if failed_count == 0 {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_convert_command(&args),
        output_dir: args.output_dir.display().to_string(),
        document_count: documents.len(),
        failed_count,
        documents,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote convert run manifest");

    if failed_count > 0 {
        bail!(
            "{failed_count} of {} documents failed; see {}",
            manifest.document_count,
            manifest_path.display()
        );
    }

    info!(documents = manifest.document_count, "convert completed");
    Ok(())
}

fn convert_document(
    pipeline: &DocumentPipeline,
    source: &Path,
    dir_name: &str,
    args: &ConvertArgs,
) -> DocumentOutcome {
    let mut outcome = DocumentOutcome {
        source: source.display().to_string(),
        document_name: document_name(source),
        sha256: sha256_file(source).ok(),
        status: STATUS_FAILED.to_string(),
        error_kind: None,
        error: None,
        counts: None,
        artifacts: Vec::new(),
    };

    let document = match pipeline.run(source) {
        Ok(document) => document,
        Err(err) => {
            error!(
                source = %source.display(),
                kind = err.kind(),
                error = %err,
                "document failed"
            );
            outcome.error_kind = Some(err.kind().to_string());
            outcome.error = Some(err.to_string());
            return outcome;
        }
    };

    let counts = document.counts();
    outcome.counts = Some(counts);

    let target = args.output_dir.join(dir_name);
    if let Err(err) = write_artifacts(&document, &target, args, &mut outcome.artifacts) {
        error!(source = %source.display(), error = %format!("{err:#}"), "failed to write artifacts");
        outcome.error_kind = Some("artifact_write_failure".to_string());
        outcome.error = Some(format!("{err:#}"));
        return outcome;
    }

    info!(
        source = %source.display(),
        units = counts.units,
        modules = counts.modules,
        questions = counts.questions,
        clusters = counts.clusters,
        "document converted"
    );
    outcome.status = STATUS_CONVERTED.to_string();
    outcome
}

struct Artifact {
    path: PathBuf,
    bytes: Vec<u8>,
}

// Renders and self-checks every artifact without touching the disk.
fn render_artifacts(
    document: &QuizDocument,
    target: &Path,
    args: &ConvertArgs,
) -> Result<Vec<Artifact>> {
    let mut artifacts = vec![Artifact {
        path: target.join("report.txt"),
        bytes: render_report(document, args.report_options()).into_bytes(),
    }];

    for module in document.modules() {
        let bytes = render_module_xml(module, args.text_markup())?;

        let summary = inspect_quiz_xml(&bytes)
            .with_context(|| format!("generated xml is unreadable [{}]", module.location()))?;
        if summary.category_count != 1
            || summary.question_names.len() != module.questions.len()
            || summary.answer_fractions.len() != module.questions.len()
        {
            bail!(
                "generated xml holds {} categories and {} questions, expected 1 and {} [{}]",
                summary.category_count,
                summary.answer_fractions.len(),
                module.questions.len(),
                module.location()
            );
        }

        artifacts.push(Artifact {
            path: target.join(module_xml_filename(module)),
            bytes,
        });
    }

    if args.emit_json {
        let mut bytes =
            serde_json::to_vec_pretty(document).context("failed to serialize quiz document")?;
        bytes.push(b'\n');
        artifacts.push(Artifact {
            path: target.join("quiz.json"),
            bytes,
        });
    }

    Ok(artifacts)
}

fn write_artifacts(
    document: &QuizDocument,
    target: &Path,
    args: &ConvertArgs,
    written: &mut Vec<String>,
) -> Result<()> {
    let artifacts = render_artifacts(document, target, args)?;

    ensure_directory(target)?;
    for artifact in artifacts {
        write_bytes(&artifact.path, &artifact.bytes)?;
        written.push(artifact.path.display().to_string());
    }

    Ok(())
}

// Two inputs with the same stem (a.docx and a.txt) would share a folder.
fn unique_dir_name(taken: &mut HashMap<String, usize>, name: &str) -> String {
    let seen = taken.entry(name.to_string()).or_insert(0);
    *seen += 1;
    if *seen == 1 {
        name.to_string()
    } else {
        format!("{name}-{seen}")
    }
}

fn render_convert_command(args: &ConvertArgs) -> String {
    let mut command = vec!["quizdoc".to_string(), "convert".to_string()];
    command.extend(args.inputs.iter().map(|path| path.display().to_string()));
    command.push("--output-dir".to_string());
    command.push(args.output_dir.display().to_string());

    if args.ordered {
        command.push("--ordered".to_string());
    }
    if args.separated {
        command.push("--separated".to_string());
        command.push("--to-divide".to_string());
        command.push(args.to_divide.to_string());
    }
    if args.emit_json {
        command.push("--emit-json".to_string());
    }
    if args.raw_html {
        command.push("--raw-html".to_string());
    }
    if let Some(path) = &args.schema {
        command.push("--schema".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.pipeline.no_accent_repair {
        command.push("--no-accent-repair".to_string());
    }
    if args.needs_clusters() {
        command.push("--questions-per-cluster".to_string());
        command.push(args.pipeline.questions_per_cluster.to_string());
        command.push("--cluster-min-size".to_string());
        command.push(args.pipeline.cluster_min_size.to_string());
    }

    command.join(" ")
}
