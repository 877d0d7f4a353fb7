use http::Method;
use signalrouter::dispatcher::Dispatcher;
use signalrouter::registry::HandlerRegistry;
use signalrouter::route_table::{load_route_table, RouteTableError};
use signalrouter::router::{Outcome, RouterError};
use signalrouter::server::Request;

mod common;
use common::temp_files::create_temp_table;
use common::Recorder;

const YAML: &str = r#"
global: [audit]
middleware:
  - path: /pets
    steps: [auth]
routes:
  - method: GET
    path: /pets/:id
    steps: [load, show]
  - method: post
    path: /pets
    steps: [create]
"#;

const TOML: &str = r#"
global = ["audit"]

[[middleware]]
path = "/pets"
steps = ["auth"]

[[routes]]
method = "GET"
path = "/pets/:id"
steps = ["load", "show"]

[[routes]]
method = "post"
path = "/pets"
steps = ["create"]
"#;

fn registry(rec: &Recorder) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("audit", rec.pass("audit"))
        .register("auth", rec.pass("auth"))
        .register("load", rec.pass("load"))
        .register("show", rec.respond("show", 200))
        .register("create", rec.respond("create", 201));
    registry
}

fn check_applied(ext: &str, content: &str) {
    let file = create_temp_table(content, ext);
    let table = load_route_table(file.path()).unwrap();
    assert_eq!(table.routes.len(), 2);

    let rec = Recorder::new();
    let mut dispatcher = Dispatcher::new();
    table.apply(&mut dispatcher, &registry(&rec)).unwrap();

    let res = dispatcher.dispatch(Request::new(Method::GET, "/pets/7"));
    assert_eq!(res.status, 200);
    assert_eq!(rec.calls(), vec!["audit", "auth", "load", "show"]);

    let created = dispatcher.dispatch(Request::new(Method::POST, "/pets"));
    assert_eq!(created.status, 201);
}

#[test]
fn test_yaml_table_applies() {
    check_applied("yaml", YAML);
}

#[test]
fn test_toml_table_applies() {
    check_applied("toml", TOML);
}

#[test]
fn test_json_table_applies() {
    let json = serde_json::json!({
        "global": ["audit"],
        "middleware": [{ "path": "/pets", "steps": ["auth"] }],
        "routes": [
            { "method": "GET", "path": "/pets/:id", "steps": ["load", "show"] },
            { "method": "POST", "path": "/pets", "steps": ["create"] }
        ]
    });
    check_applied("json", &json.to_string());
}

#[test]
fn test_unknown_handler_is_invalid_handler() {
    let file = create_temp_table(
        "routes:\n  - method: GET\n    path: /a\n    steps: [nope]\n",
        "yml",
    );
    let table = load_route_table(file.path()).unwrap();
    let err = table
        .apply(&mut Dispatcher::new(), &HandlerRegistry::new())
        .unwrap_err();
    assert_eq!(
        err,
        RouterError::InvalidHandler {
            method: Method::GET,
            path: "/a".into(),
            name: "nope".into()
        }
    );
}

#[test]
fn test_unknown_global_middleware() {
    let file = create_temp_table("global: [ghost]\n", "yaml");
    let table = load_route_table(file.path()).unwrap();
    let err = table
        .apply(&mut Dispatcher::new(), &HandlerRegistry::new())
        .unwrap_err();
    assert!(matches!(err, RouterError::UnknownMiddleware { ref path, ref name } if path == "*" && name == "ghost"));
}

#[test]
fn test_duplicate_route_keeps_earlier_registrations() {
    let file = create_temp_table(
        "routes:\n  - {method: GET, path: /a, steps: [show]}\n  - {method: GET, path: /a/, steps: [show]}\n",
        "yaml",
    );
    let table = load_route_table(file.path()).unwrap();
    let rec = Recorder::new();
    let mut dispatcher = Dispatcher::new();
    let err = table.apply(&mut dispatcher, &registry(&rec)).unwrap_err();
    assert!(matches!(err, RouterError::Conflict { .. }));
    assert_eq!(
        dispatcher.resolve(&Method::GET, "/a").outcome,
        Outcome::Found
    );
}

#[test]
fn test_invalid_method_token() {
    let file = create_temp_table(
        "routes:\n  - {method: \"GE T\", path: /a, steps: [show]}\n",
        "yaml",
    );
    let table = load_route_table(file.path()).unwrap();
    let rec = Recorder::new();
    let err = table
        .apply(&mut Dispatcher::new(), &registry(&rec))
        .unwrap_err();
    assert!(matches!(err, RouterError::InvalidMethod { .. }));
}

#[test]
fn test_load_errors() {
    let broken = create_temp_table("routes: [", "yaml");
    assert!(matches!(
        load_route_table(broken.path()),
        Err(RouteTableError::Parse { .. })
    ));

    let unknown_field = create_temp_table("handlers: []\n", "yaml");
    assert!(matches!(
        load_route_table(unknown_field.path()),
        Err(RouteTableError::Parse { .. })
    ));

    assert!(matches!(
        load_route_table("/definitely/not/here.yaml"),
        Err(RouteTableError::Io { .. })
    ));
}
