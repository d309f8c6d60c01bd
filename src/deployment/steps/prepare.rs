use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::deployment::DeploymentContext;
use crate::registry::{self, ChainRegistry};
use crate::serde_utils;
use crate::templating::{self, SourceTemplate, TemplateReport, QUOTE_TEMPLATE};

/// Applies `template` to the file at `path` and writes it back only when
/// something changed. Drift aborts before the write.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn rewrite_source(
    context: &DeploymentContext,
    path: &Path,
    registry: &ChainRegistry,
    template: &SourceTemplate,
) -> eyre::Result<TemplateReport> {
    let text = serde_utils::read_text(path, "Template").await?;

    let (rewritten, report) = templating::apply(
        &text,
        registry,
        template,
        context.meta.display_name,
        &context.normalizer,
    )?;

    report.ensure_no_drift()?;

    if report.changed() {
        serde_utils::write_atomic(path, rewritten).await?;
        info!("Rewrote source");
    } else {
        info!("Source already current");
    }

    Ok(report)
}

pub fn print_report(path: &Path, report: &TemplateReport) {
    println!("{}", path.display());
    for (name, outcome) in &report.constants {
        println!("  {name}: {outcome}");
    }
    println!("  network comment: {}", report.network_comment);
}

#[instrument(skip_all, fields(chain = context.meta.alias))]
pub async fn run(
    context: &DeploymentContext,
    target: Option<&Path>,
) -> eyre::Result<()> {
    let path: PathBuf = context.project_path(
        target.unwrap_or(context.config.paths.source_template.as_path()),
    );

    let registry = registry::load(
        context.deployed_dir(),
        &context.meta,
        &context.normalizer,
    )
    .await?;

    let report =
        rewrite_source(context, &path, &registry, &QUOTE_TEMPLATE).await?;

    print_report(&path, &report);

    Ok(())
}
