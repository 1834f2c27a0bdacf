//! `convergent apply`: submit a desired state and wait for convergence.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;

use convergent_core::{
    ActivationRequest, AsMapSpec, CollectionScope, CoreError, DesiredState, EdgeHostname,
    HttpGateway, IpBehavior, MutationOrchestrator, MutationOutcome, OperationKind,
    RemoteItem, TerminalStatuses,
};

use super::util::{cancel_on_ctrl_c, read_document};
use crate::cli::{ApplyArgs, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Documents ────────────────────────────────────────────────────────

/// A desired-state file: one of the typed resource families, or a raw
/// desired state for anything else.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Document {
    Activation(ActivationDocument),
    AsMap(AsMapSpec),
    EdgeHostname(HostnameDocument),
    Desired(DesiredState),
}

#[derive(Debug, Deserialize)]
pub struct ActivationDocument {
    /// `ACTIVATE` or `DEACTIVATE`.
    #[serde(default = "default_action")]
    pub action: OperationKind,
    #[serde(flatten)]
    pub request: ActivationRequest,
}

fn default_action() -> OperationKind {
    OperationKind::Activate
}

#[derive(Debug, Deserialize)]
pub struct HostnameDocument {
    /// Collection the hostname is created in.
    pub scope: CollectionScope,
    /// Full hostname, e.g. `www.example.com.edgekey.net`.
    pub hostname: String,
    #[serde(default = "default_ipv4")]
    pub ipv4: bool,
    #[serde(default)]
    pub ipv6: bool,
    /// Certificate enrollment id (enhanced TLS only).
    pub certificate: Option<i64>,
}

fn default_ipv4() -> bool {
    true
}

impl Document {
    /// The desired state, and whether the document itself asks to wait.
    pub fn into_desired(self) -> Result<(DesiredState, bool), CoreError> {
        match self {
            Self::Activation(doc) => Ok((doc.request.desired_state(doc.action)?, true)),
            Self::AsMap(spec) => Ok((spec.desired_state()?, spec.wait_on_complete)),
            Self::EdgeHostname(doc) => {
                let mut hostname = EdgeHostname::parse(&doc.hostname)?
                    .with_ip_behavior(IpBehavior::from_flags(doc.ipv4, doc.ipv6)?);
                if let Some(certificate) = doc.certificate {
                    hostname = hostname.with_certificate(certificate);
                }
                Ok((hostname.desired_state(doc.scope)?, true))
            }
            Self::Desired(desired) => Ok((desired, true)),
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: &ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let document: Document = read_document(&args.file)?;
    let (desired, document_waits) = document.into_desired()?;

    let resolved = config::resolve(global, &args.poll)?;
    let mut options = resolved.options.with_cancellation(cancel_on_ctrl_c());
    if args.no_wait || !document_waits {
        options = options.no_wait();
    }

    let gateway = HttpGateway::connect(&resolved.gateway)?;
    let orchestrator = MutationOrchestrator::new(Arc::new(gateway));
    let outcome = orchestrator.perform_mutation(&desired, &options).await?;

    let terminal = desired.terminal_statuses();
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &outcome,
        |o| describe(o, &terminal, color),
        plain_id,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Human-readable summary of an outcome.
fn describe(outcome: &MutationOutcome, terminal: &TerminalStatuses, color: bool) -> String {
    let mut out = String::new();
    match outcome {
        MutationOutcome::Skipped => out.push_str("Skipped: desired state is disabled"),
        MutationOutcome::AlreadyAbsent => out.push_str("Nothing to do: target does not exist"),
        MutationOutcome::Reused { id, items } => {
            let _ = writeln!(out, "Reused existing object {id}");
            append_items(&mut out, items);
        }
        MutationOutcome::Accepted { operation } => {
            let _ = writeln!(
                out,
                "Accepted: {} operation {} ({})",
                operation.kind,
                operation.handle,
                output::paint_status(operation.status(), terminal, color),
            );
            let _ = write!(
                out,
                "Resume with: convergent wait {} --kind {}",
                operation.handle,
                operation.kind.to_string().to_ascii_lowercase(),
            );
        }
        MutationOutcome::Converged { id, report, items } => {
            let _ = write!(
                out,
                "Converged: {}",
                output::paint_status(&report.status, terminal, color)
            );
            if let Some(id) = id {
                let _ = write!(out, " (id {id})");
            }
            out.push('\n');
            append_items(&mut out, items);
        }
    }
    out.trim_end().to_owned()
}

fn append_items(out: &mut String, items: &[RemoteItem]) {
    if items.is_empty() {
        return;
    }
    if let Ok(table) = output::render_items(OutputFormat::Table, items) {
        out.push_str(&table);
    }
}

fn plain_id(outcome: &MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Reused { id, .. } | MutationOutcome::Converged { id: Some(id), .. } => {
            id.to_string()
        }
        MutationOutcome::Accepted { operation } => operation.handle.to_string(),
        MutationOutcome::Converged { id: None, .. }
        | MutationOutcome::Skipped
        | MutationOutcome::AlreadyAbsent => String::new(),
    }
}
