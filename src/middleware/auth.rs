use tracing::debug;

use super::Step;

/// Chaining step that only advances when the `authorization` header equals
/// `token`. Anything else commits `401 {"error": "Unauthorized"}` and ends
/// the chain.
pub fn bearer_auth(token: impl Into<String>) -> Step {
    let token = token.into();
    Step::chain(move |ctx, next| match ctx.req.header("authorization") {
        Some(h) if h == token => next.run(ctx),
        other => {
            debug!(
                request_id = %ctx.req.request_id(),
                path = %ctx.req.path(),
                header_present = other.is_some(),
                "Authorization rejected"
            );
            ctx.res
                .status(401)
                .json(&serde_json::json!({ "error": "Unauthorized" }))?;
            Ok(())
        }
    })
}
