//! Show command implementation.
//!
//! Without a selector the whole tree is listed with test-case indices. With
//! one, the resolved node is shown with failure analysis and, on request,
//! its activity timeline.

use super::CommandContext;
use crate::cli::ShowArgs;
use crate::diagnostics::DiagnosticsEngine;
use crate::error::Result;
use crate::format::{
    FailureView, NodeDetails, TimelineSectionView, TreeListing, render_details, render_listing,
};
use crate::loader::ResultDocument;
use crate::model::{ResultKind, TestNode};
use crate::output::OutputContext;
use crate::resolve::NodeResolver;
use crate::store::{self, ExportDirStore, ResultStore};
use crate::timeline;
use crate::util::{is_result_bundle, newest_bundle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAX_SIMILAR: usize = 3;

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or a primary document
/// fails to load. A selector that matches nothing is not an error.
pub fn execute(args: &ShowArgs, ctx: &CommandContext) -> Result<()> {
    let path = resolve_bundle_path(&args.path, &ctx.output)?;
    let store = store::open(&path, &ctx.config)?;
    let document = ResultDocument::load(store.as_ref())?;

    match args.selector.as_deref().map(str::trim) {
        Some(selector) if !selector.is_empty() => {
            show_node(selector, &document, store.as_ref(), args.console, ctx)
        }
        _ => show_listing(&document, ctx),
    }
}

/// A project directory stands for its newest bundle.
fn resolve_bundle_path(path: &Path, output: &OutputContext) -> Result<PathBuf> {
    if path.is_dir() && !is_result_bundle(path) && !ExportDirStore::is_export_dir(path) {
        let newest = newest_bundle(path)?;
        info!(bundle = %newest.display(), "Using newest result bundle");
        output.notice(&format!("Using newest result bundle: {}", newest.display()));
        return Ok(newest);
    }
    Ok(path.to_path_buf())
}

fn show_listing(document: &ResultDocument, ctx: &CommandContext) -> Result<()> {
    let listing = TreeListing::build(document);
    if ctx.output.is_json() {
        return ctx.output.json_pretty(&listing);
    }
    ctx.output
        .lines(&render_listing(&listing, ctx.output.text_options()));
    Ok(())
}

/// Failure texts for a node: the summary's record first, else the node's own
/// failure-message children.
fn failure_texts(document: &ResultDocument, node: &TestNode) -> Vec<(String, Option<String>)> {
    if let Some(failure) = node
        .node_identifier
        .as_deref()
        .and_then(|id| document.summary.failure_for(id))
    {
        let target = (!failure.target_name.is_empty()).then(|| failure.target_name.clone());
        return vec![(failure.failure_text.clone(), target)];
    }
    node.failure_messages()
        .map(|message| (message.name.clone(), None))
        .collect()
}

fn show_node(
    selector: &str,
    document: &ResultDocument,
    store: &dyn ResultStore,
    console: bool,
    ctx: &CommandContext,
) -> Result<()> {
    let resolver = NodeResolver::new(&document.tests.test_nodes);
    let Some(resolved) = resolver.resolve(selector) else {
        return report_not_found(selector, &resolver, ctx);
    };
    let node = resolved.node;
    debug!(name = %node.name, match_type = ?resolved.match_type, "Resolved node");

    let mut details = NodeDetails::new(node, resolved.match_type);

    if node.result_kind() == ResultKind::Failed {
        let engine = DiagnosticsEngine::with_suite_hints(&ctx.config.suite_hints);
        details.failures = failure_texts(document, node)
            .into_iter()
            .map(|(text, target)| FailureView {
                report: engine.analyze(&text),
                text,
                target,
            })
            .collect();
    }

    if console {
        match node.node_identifier.as_deref() {
            Some(test_id) => {
                let report = timeline::collect(store, test_id);
                details.timeline = Some(TimelineSectionView::from_report(&report));
            }
            None => ctx
                .output
                .warning("Selected node has no identifier; timeline unavailable"),
        }
    }

    if ctx.output.is_json() {
        return ctx.output.json_pretty(&details);
    }
    ctx.output
        .lines(&render_details(&details, ctx.output.text_options()));
    Ok(())
}

#[derive(Serialize)]
struct NotFound<'a> {
    found: bool,
    selector: &'a str,
    test_case_count: usize,
    similar: Vec<String>,
}

/// Print numbering guidance for a selector that matched nothing.
fn report_not_found(selector: &str, resolver: &NodeResolver<'_>, ctx: &CommandContext) -> Result<()> {
    let count = resolver.test_case_count();
    let similar = resolver.similar_identifiers(selector, MAX_SIMILAR);
    info!(selector, count, "No node matched selector");

    if ctx.output.is_json() {
        return ctx.output.json_pretty(&NotFound {
            found: false,
            selector,
            test_case_count: count,
            similar,
        });
    }

    let mut lines = vec![format!("No test matches '{selector}'.")];
    if count == 0 {
        lines.push("This result contains no test cases.".to_string());
    } else {
        lines.push(format!(
            "Use a test identifier, or an index from 1 to {count} as printed by `xctriage show <path>`."
        ));
    }
    if !similar.is_empty() {
        lines.push(format!("Did you mean: {}", similar.join(", ")));
    }
    ctx.output.lines(&lines);
    Ok(())
}
