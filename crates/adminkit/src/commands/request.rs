//! Raw route proxy access.

use adminkit_api::{ApiClient, Payload, RouteProxy, Verb};
use serde_json::Value;
use tracing::debug;

use crate::cli::{GlobalOpts, HelloArgs, RequestArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Chain the given segments onto the client root and dispatch once.
pub async fn handle(client: &ApiClient, args: RequestArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let proxy = build(client, &args)?;
    debug!(template = %proxy.template(), url = %proxy.url(), "raw request");

    match proxy.dispatch().await? {
        Payload::Json(value) => {
            let out = output::render_single(&global.output_format(), &value, output::detail, |v| {
                output::cell(v.get("id").or(Some(v)))
            });
            output::print_output(&out, global.quiet);
        }
        Payload::File { filename, path } => {
            client
                .hooks()
                .notify_success(&format!("Saved {filename} to {}", path.display()));
        }
    }
    Ok(())
}

fn build(client: &ApiClient, args: &RequestArgs) -> Result<RouteProxy, CliError> {
    let mut proxy = args
        .segments
        .iter()
        .fold(client.request(), |proxy, segment| proxy.path(segment.as_str()));

    if let Some(ref method) = args.method {
        let verb: Verb = method.parse().map_err(|_| {
            CliError::validation("method", format!("expected GET, POST, PUT or DELETE, got '{method}'"))
        })?;
        proxy = proxy.method(verb);
    }
    if !args.params.is_empty() {
        proxy = proxy.params(Value::Object(util::pairs_to_object("param", &args.params)?));
    }
    if !args.query.is_empty() {
        proxy = proxy.query(Value::Object(util::pairs_to_object("query", &args.query)?));
    }
    for raw in &args.headers {
        let (name, value) = util::split_pair("header", raw, ':')?;
        proxy = proxy.header(name, value.trim());
    }

    let body = match (&args.body, &args.body_file) {
        (Some(text), _) => Some(serde_json::from_str::<Value>(text)?),
        (None, Some(path)) => Some(util::read_json_file(path)?),
        (None, None) => None,
    };
    if let Some(body) = body {
        proxy = proxy.body(body);
    }
    if args.no_redirect {
        proxy = proxy.auto_redirect(false);
    }
    Ok(proxy)
}

/// `GET` (or `POST`) the hello route and print its greeting.
pub async fn hello(client: &ApiClient, args: HelloArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let route = client.route("hello");
    let reply = if args.post {
        route.post().send().await?
    } else {
        route.get().await?
    };
    let greeting = reply
        .get("result")
        .and_then(Value::as_str)
        .map_or_else(|| reply.to_string(), str::to_owned);
    output::print_output(&greeting, global.quiet);
    Ok(())
}
