//! `convergent resolve`: offline identity lookup.

use convergent_core::{BusinessKey, KeyPart, RemoteItem, resolve_identity};

use super::util::read_document;
use crate::cli::{GlobalOpts, ResolveArgs};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ResolveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let observed: Vec<RemoteItem> = read_document(&args.observed)?;
    let key = parse_key(&args.key);

    let resolution = resolve_identity(&key, &observed);
    let Some(id) = resolution.clone().found() else {
        return Err(CliError::NotFound {
            what: format!("item with key {key}"),
        });
    };

    let out = output::render_single(
        global.output,
        &resolution,
        |_| id.to_string(),
        |_| id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn parse_key(parts: &[String]) -> BusinessKey {
    BusinessKey::new(
        parts
            .iter()
            .map(|p| p.parse::<KeyPart>().unwrap_or_else(|never| match never {})),
    )
}
