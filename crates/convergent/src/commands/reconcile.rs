//! `convergent reconcile`: offline merge of declared and observed items.

use convergent_core::{RemoteItem, reconcile};

use super::util::read_document;
use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ReconcileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let declared: Vec<RemoteItem> = read_document(&args.declared)?;
    let observed: Vec<RemoteItem> = read_document(&args.observed)?;

    let merged = reconcile(&declared, &observed);
    tracing::debug!(
        declared = declared.len(),
        observed = observed.len(),
        merged = merged.len(),
        "reconciled"
    );

    let out = output::render_items(global.output, &merged)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
