//! `convergent wait`: resume an in-flight operation and wait on it.

use serde::Serialize;

use convergent_core::{
    ConvergenceOperation, CoreError, HttpGateway, OperationContext, OperationHandle,
    OperationKind, Poller, StatusReport, TerminalOutcome,
};

use super::util::cancel_on_ctrl_c;
use crate::cli::{GlobalOpts, WaitArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct WaitResult {
    handle: OperationHandle,
    kind: OperationKind,
    #[serde(flatten)]
    report: StatusReport,
}

pub async fn handle(args: &WaitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global, &args.poll)?;
    let gateway = HttpGateway::connect(&resolved.gateway)?;

    let kind = OperationKind::from(args.kind);
    let terminal = args.vocabulary.statuses(kind);
    let handle = OperationHandle::new(args.handle.clone());

    let operation =
        ConvergenceOperation::resume(kind, handle.clone(), terminal.clone(), &gateway).await?;
    tracing::info!(%handle, status = %operation.status(), "resumed operation");

    let outcome = Poller::new(&gateway, resolved.options.poll)
        .with_cancellation(cancel_on_ctrl_c())
        .with_deadline(resolved.options.deadline)
        .run(operation)
        .await?;

    let report = match outcome {
        TerminalOutcome::Succeeded(report) => report,
        TerminalOutcome::Failed(report) => {
            return Err(CoreError::RemoteRejected {
                message: report.explanation(),
                context: Some(OperationContext::new(kind).with_handle(handle)),
            }
            .into());
        }
    };

    let color = output::should_color(global.color);
    let result = WaitResult {
        handle,
        kind,
        report,
    };
    let out = output::render_single(
        global.output,
        &result,
        |r| {
            format!(
                "{} operation {}: {}",
                r.kind,
                r.handle,
                output::paint_status(&r.report.status, &terminal, color)
            )
        },
        |r| r.report.status.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
