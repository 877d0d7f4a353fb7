use serde_json::json;

use crate::middleware::Step;

/// Terminal step that commits a JSON echo of the matched request.
pub fn echo_handler() -> Step {
    Step::terminal(|ctx| {
        let params: serde_json::Map<String, serde_json::Value> = ctx
            .req
            .params()
            .iter()
            .map(|(k, v)| (k.to_owned(), json!(v)))
            .collect();
        let query: Vec<serde_json::Value> = ctx
            .req
            .query_params()
            .iter()
            .map(|(k, v)| json!([&**k, v]))
            .collect();
        let body = ctx.req.body_json().ok().cloned();
        let echo = json!({
            "request_id": ctx.req.request_id(),
            "method": ctx.req.method().as_str(),
            "path": ctx.req.path(),
            "params": params,
            "query": query,
            "body": body,
        });
        ctx.res.json(&echo)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::execute;
    use crate::server::{Context, Request};
    use http::Method;

    #[test]
    fn test_echo_reports_request() {
        let mut ctx = Context::new(
            Request::new(Method::POST, "/pets?limit=2").with_json(&json!({"name": "rex"})),
        );
        execute(&[echo_handler()], &mut ctx).unwrap();
        let body = ctx.res.response().unwrap().body_json().unwrap();
        assert_eq!(body["method"], "POST");
        assert_eq!(body["path"], "/pets");
        assert_eq!(body["query"][0], json!(["limit", "2"]));
        assert_eq!(body["body"]["name"], "rex");
    }
}
