use http::Method;
use signalrouter::middleware::Step;
use signalrouter::router::{Outcome, Router, RouterError};

mod common;
use common::{text, Recorder};
use tracing_util::TestTracing;

#[test]
fn test_every_registered_route_resolves_to_its_handler() {
    let paths = [
        "/",
        "/pets",
        "/pets/:id",
        "/pets/:id/toys",
        "/users/:user_id/posts/:post_id",
        "/admin/settings",
    ];
    let mut router = Router::new();
    let handlers: Vec<Step> = paths.iter().map(|_| text("ok")).collect();
    for (path, handler) in paths.iter().zip(&handlers) {
        router.get(path, [handler.clone()]).unwrap();
    }

    let requests = [
        "/",
        "/pets",
        "/pets/1",
        "/pets/1/toys",
        "/users/9/posts/abc",
        "/admin/settings",
    ];
    for (request, handler) in requests.iter().zip(&handlers) {
        let result = router.resolve(&Method::GET, request);
        assert_eq!(result.outcome, Outcome::Found, "{request}");
        assert!(result.handler().unwrap().ptr_eq(handler), "{request}");
    }
}

#[test]
fn test_params_capture_literal_segments() {
    let mut router = Router::new();
    router
        .get("/users/:user_id/posts/:post_id", [text("post")])
        .unwrap();
    let params = router
        .resolve(&Method::GET, "/users/42/posts/hello-world")
        .params
        .unwrap();
    assert_eq!(params.get("user_id"), Some("42"));
    assert_eq!(params.get("post_id"), Some("hello-world"));
    assert_eq!(params.get("missing"), None);
}

#[test]
fn test_first_registered_param_name_captures() {
    let mut router = Router::new();
    router.get("/items/:id", [text("a")]).unwrap();
    router.post("/items/:item_id", [text("b")]).unwrap();

    let params = router.resolve(&Method::POST, "/items/5").params.unwrap();
    assert_eq!(params.get("id"), Some("5"));
    assert_eq!(params.get("item_id"), None);
}

#[test]
fn test_empty_segments_are_ignored() {
    let mut router = Router::new();
    router.get("/a/b", [text("ab")]).unwrap();
    assert_eq!(router.resolve(&Method::GET, "//a///b/").outcome, Outcome::Found);
}

#[test]
fn test_different_methods_share_a_path() {
    let mut router = Router::new();
    router.get("/users", [text("list")]).unwrap();
    router.post("/users", [text("create")]).unwrap();
    router.patch("/users", [text("patch")]).unwrap();
    let err = router.post("/users", [text("again")]).unwrap_err();
    assert!(matches!(err, RouterError::Conflict { method, .. } if method == Method::POST));
}

#[test]
fn test_method_not_allowed_allow_list() {
    let mut router = Router::new();
    router.get("/users", [text("list")]).unwrap();
    router.post("/users", [text("create")]).unwrap();

    let result = router.resolve(&Method::DELETE, "/users");
    assert_eq!(result.outcome, Outcome::MethodNotAllowed);
    assert_eq!(result.allow_header().as_deref(), Some("GET, POST"));
}

#[test]
fn test_not_found_keeps_accumulated_middleware() {
    let rec = Recorder::new();
    let mut router = Router::new();
    router.use_at("/", rec.pass("root"));
    router.use_at("/users", rec.pass("users"));
    router.get("/users", [text("list")]).unwrap();

    let missing = router.resolve(&Method::GET, "/missing");
    assert_eq!(missing.outcome, Outcome::NotFound);
    assert_eq!(missing.stack.len(), 1);

    // partial walk into /users picks up its middleware too
    let deeper = router.resolve(&Method::GET, "/users/1/extra");
    assert_eq!(deeper.outcome, Outcome::NotFound);
    assert_eq!(deeper.stack.len(), 2);
}

#[test]
fn test_mount_and_nested_mount() {
    let mut leaf = Router::new();
    leaf.get("/x", [text("x")]).unwrap();

    let mut mid = Router::new();
    mid.mount("/v1", leaf).unwrap();

    let mut root = Router::new();
    root.mount("/api", mid).unwrap();

    assert_eq!(root.resolve(&Method::GET, "/api/v1/x").outcome, Outcome::Found);
    assert_eq!(root.route_patterns(), vec!["GET /api/v1/x"]);
}

#[test]
fn test_mount_at_root_merges_param_subtrees() {
    let mut root = Router::new();
    root.get("/pets/:id", [text("get")]).unwrap();

    let mut sub = Router::new();
    sub.delete("/pets/:pet_id", [text("delete")]).unwrap();
    sub.get("/pets/:pet_id/toys", [text("toys")]).unwrap();

    root.mount("/", sub).unwrap();

    let deleted = root.resolve(&Method::DELETE, "/pets/3");
    assert_eq!(deleted.outcome, Outcome::Found);
    // the target's parameter name is kept
    assert_eq!(deleted.params.unwrap().get("id"), Some("3"));
    assert_eq!(root.resolve(&Method::GET, "/pets/3/toys").outcome, Outcome::Found);
}

#[test]
fn test_mount_collision_is_conflict() {
    let mut root = Router::new();
    root.get("/api/x", [text("root")]).unwrap();

    let mut sub = Router::new();
    sub.get("/x", [text("sub")]).unwrap();

    let err = root.mount("/api", sub).unwrap_err();
    assert_eq!(err.to_string(), "route conflict: GET /api/x is already registered");
}

#[test]
fn test_registration_and_resolution_are_logged() {
    let tracing = TestTracing::init();
    let mut router = Router::new();
    router.get("/users", [text("list")]).unwrap();
    let denied = router.resolve(&Method::PUT, "/users");
    assert_eq!(denied.outcome, Outcome::MethodNotAllowed);

    let registered = tracing.find("Route registered");
    assert_eq!(registered.len(), 1);
    assert!(registered[0].contains("path=/users"));
    assert_eq!(tracing.find("Method not allowed").len(), 1);
}
