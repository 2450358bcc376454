//! Find command implementation.

use crate::cli::FindArgs;
use crate::error::Result;
use crate::format::render_bundles;
use crate::output::OutputContext;
use crate::util::find_bundles;
use tracing::debug;

/// Execute the find command.
///
/// # Errors
///
/// Returns `BundleNotFound` for a missing directory and `NoResultBundles`
/// when the search comes up empty.
pub fn execute(args: &FindArgs, ctx: &OutputContext) -> Result<()> {
    let mut bundles = find_bundles(&args.dir)?;
    if let Some(limit) = args.limit {
        debug!(limit, total = bundles.len(), "Limiting bundle list");
        bundles.truncate(limit);
    }

    if ctx.is_json() {
        return ctx.json_pretty(&bundles);
    }
    ctx.lines(&render_bundles(&bundles));
    Ok(())
}
