use http::Method;

use super::{Outcome, Router, RouterError};
use crate::middleware::Step;
use crate::registry::HandlerRegistry;

fn handler() -> Step {
    Step::terminal(|ctx| Ok(ctx.res.text("ok")?))
}

fn pass() -> Step {
    Step::chain(|ctx, next| next.run(ctx))
}

#[test]
fn test_found_returns_registered_handler() {
    let mut router = Router::new();
    let users = handler();
    let posts = handler();
    router.get("/users", [users.clone()]).unwrap();
    router.get("/posts", [posts.clone()]).unwrap();

    let result = router.resolve(&Method::GET, "/users");
    assert_eq!(result.outcome, Outcome::Found);
    assert!(result.handler().unwrap().ptr_eq(&users));
    assert!(!result.handler().unwrap().ptr_eq(&posts));
}

#[test]
fn test_duplicate_registration_conflicts() {
    let mut router = Router::new();
    router.get("/users", [handler()]).unwrap();
    router.post("/users", [handler()]).unwrap();
    let err = router.get("/users/", [handler()]).unwrap_err();
    assert_eq!(
        err,
        RouterError::Conflict {
            method: Method::GET,
            path: "/users/".into()
        }
    );
}

#[test]
fn test_empty_steps_is_missing_handler() {
    let mut router = Router::new();
    let err = router.put("/a", Vec::new()).unwrap_err();
    assert!(matches!(err, RouterError::MissingHandler { .. }));
    assert_eq!(router.route_count(), 0);
}

#[test]
fn test_param_capture() {
    let mut router = Router::new();
    router.get("/users/:id", [handler()]).unwrap();
    let result = router.resolve(&Method::GET, "/users/42");
    let params = result.params.unwrap();
    assert_eq!(params.get("id"), Some("42"));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_static_child_preferred_over_param() {
    let mut router = Router::new();
    let me = handler();
    router.get("/users/me", [me.clone()]).unwrap();
    router.get("/users/:id", [handler()]).unwrap();

    let result = router.resolve(&Method::GET, "/users/me");
    assert!(result.handler().unwrap().ptr_eq(&me));
    assert!(result.params.unwrap().is_empty());
}

#[test]
fn test_repeated_param_name_keeps_deepest_value() {
    let mut router = Router::new();
    router.get("/:id/children/:id", [handler()]).unwrap();
    let result = router.resolve(&Method::GET, "/1/children/2");
    let params = result.params.unwrap();
    assert_eq!(params.get("id"), Some("2"));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_no_backtracking_after_static_descent() {
    let mut router = Router::new();
    router.get("/a/b", [handler()]).unwrap();
    router.get("/a/:x/c", [handler()]).unwrap();
    // "b" descends into the static child, which has no "c".
    let result = router.resolve(&Method::GET, "/a/b/c");
    assert_eq!(result.outcome, Outcome::NotFound);
}

#[test]
fn test_method_not_allowed_lists_methods_in_order() {
    let mut router = Router::new();
    router.get("/users", [handler()]).unwrap();
    router.post("/users", [handler()]).unwrap();

    let result = router.resolve(&Method::DELETE, "/users");
    assert_eq!(result.outcome, Outcome::MethodNotAllowed);
    assert_eq!(result.allow, Some(vec![Method::GET, Method::POST]));
    assert!(result.params.is_none());
    assert!(result.handler().is_none());
}

#[test]
fn test_intermediate_node_without_routes_is_not_found() {
    let mut router = Router::new();
    router.get("/a/b", [handler()]).unwrap();
    let result = router.resolve(&Method::GET, "/a");
    assert_eq!(result.outcome, Outcome::NotFound);
    assert!(result.allow.is_none());
}

#[test]
fn test_not_found_keeps_root_middleware() {
    let mut router = Router::new();
    let root_mw = pass();
    router.use_at("/", root_mw.clone());
    router.get("/users", [handler()]).unwrap();

    let result = router.resolve(&Method::GET, "/missing");
    assert_eq!(result.outcome, Outcome::NotFound);
    assert_eq!(result.stack.len(), 1);
    assert!(result.stack[0].ptr_eq(&root_mw));
}

#[test]
fn test_stack_order_path_then_route_then_handler() {
    let mut router = Router::new();
    let root_mw = pass();
    let api_mw = pass();
    let route_mw = pass();
    let h = handler();
    router.use_at("/", root_mw.clone());
    router.use_at("/api", api_mw.clone());
    router
        .get("/api/items", [route_mw.clone(), h.clone()])
        .unwrap();

    let stack = router.resolve(&Method::GET, "/api/items").stack;
    assert_eq!(stack.len(), 4);
    assert!(stack[0].ptr_eq(&root_mw));
    assert!(stack[1].ptr_eq(&api_mw));
    assert!(stack[2].ptr_eq(&route_mw));
    assert!(stack[3].ptr_eq(&h));
}

#[test]
fn test_mount_under_prefix() {
    let mut sub = Router::new();
    sub.get("/x", [handler()]).unwrap();

    let mut root = Router::new();
    root.mount("/api", sub).unwrap();

    assert_eq!(root.resolve(&Method::GET, "/api/x").outcome, Outcome::Found);
    assert_eq!(root.resolve(&Method::GET, "/x").outcome, Outcome::NotFound);
}

#[test]
fn test_mount_conflict_reports_full_path() {
    let mut root = Router::new();
    root.get("/api/x", [handler()]).unwrap();

    let mut sub = Router::new();
    sub.get("/x", [handler()]).unwrap();
    sub.get("/y", [handler()]).unwrap();

    let err = root.mount("/api", sub).unwrap_err();
    assert_eq!(
        err,
        RouterError::Conflict {
            method: Method::GET,
            path: "/api/x".into()
        }
    );
    // all-or-nothing: "/api/y" from the failed mount is absent
    assert_eq!(root.resolve(&Method::GET, "/api/y").outcome, Outcome::NotFound);
}

#[test]
fn test_mount_appends_source_middleware_after_target() {
    let target_mw = pass();
    let source_mw = pass();

    let mut root = Router::new();
    root.use_at("/api", target_mw.clone());

    let mut sub = Router::new();
    sub.use_at("/", source_mw.clone());
    sub.get("/ping", [handler()]).unwrap();

    root.mount("/api", sub).unwrap();
    let stack = root.resolve(&Method::GET, "/api/ping").stack;
    assert!(stack[0].ptr_eq(&target_mw));
    assert!(stack[1].ptr_eq(&source_mw));
}

#[test]
fn test_route_patterns_lists_bindings() {
    let mut router = Router::new();
    router.get("/", [handler()]).unwrap();
    router.get("/users/:id", [handler()]).unwrap();
    router.delete("/users/:id", [handler()]).unwrap();
    assert_eq!(
        router.route_patterns(),
        vec!["DELETE /users/:id", "GET /", "GET /users/:id"]
    );
}

#[test]
fn test_named_route_resolution_errors() {
    let mut registry = HandlerRegistry::new();
    registry.register("ok", handler());
    registry.register("mw", pass());

    let mut router = Router::new();
    router
        .register_named_route(Method::GET, "/a", &["mw", "ok"], &registry)
        .unwrap();

    let err = router
        .register_named_route(Method::GET, "/b", &["missing"], &registry)
        .unwrap_err();
    assert!(matches!(err, RouterError::InvalidHandler { ref name, .. } if name == "missing"));

    let err = router
        .register_named_route(Method::GET, "/c", &["nope", "ok"], &registry)
        .unwrap_err();
    assert!(matches!(err, RouterError::UnknownMiddleware { ref name, .. } if name == "nope"));

    let empty: [&str; 0] = [];
    let err = router
        .register_named_route(Method::GET, "/d", &empty, &registry)
        .unwrap_err();
    assert!(matches!(err, RouterError::MissingHandler { .. }));
}
