//! Tests for the command Dispatcher
//!
//! These tests verify:
//! - Every command maps to the right registry operation
//! - Response shapes for success and failure
//! - Argument validation
//! - SHUTDOWN is reported as a control outcome, not a response

use carreg::protocol::{Request, Response, Value};
use carreg::{Dispatcher, Outcome, Registry};

// =============================================================================
// Helper Functions
// =============================================================================

fn reply(dispatcher: &Dispatcher, registry: &Registry, request: Request) -> Response {
    match dispatcher.dispatch(registry, &request) {
        Outcome::Reply(response) => response,
        Outcome::Shutdown => panic!("Unexpected shutdown for {:?}", request),
    }
}

fn setup() -> (Dispatcher, Registry) {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();
    registry.register("ABD777", 2, 5, "Bob").unwrap();
    registry.register("XYZ 1", 7, 0, "Carol").unwrap();
    (Dispatcher::new(), registry)
}

fn plates(response: &Response) -> Vec<&str> {
    response.results[0]
        .as_list()
        .unwrap()
        .iter()
        .map(|v| v.as_text().unwrap())
        .collect()
}

// =============================================================================
// Read Commands
// =============================================================================

#[test]
fn test_get_cars_list() {
    let (dispatcher, registry) = setup();
    let response = reply(&dispatcher, &registry, Request::cars_list());

    assert!(response.success);
    assert_eq!(plates(&response), vec!["ABC123", "ABD777", "XYZ 1"]);
}

#[test]
fn test_get_cars_list_empty() {
    let response = reply(&Dispatcher::new(), &Registry::new(), Request::cars_list());
    assert_eq!(response, Response::failure("No have cars in base"));
}

#[test]
fn test_get_car_details() {
    let (dispatcher, registry) = setup();
    let response = reply(&dispatcher, &registry, Request::car_details("ABC123"));

    assert_eq!(
        response,
        Response::ok(vec![Value::Int(4), Value::Int(100), Value::Text("Alice".into())])
    );
}

#[test]
fn test_get_car_details_unknown() {
    let (dispatcher, registry) = setup();
    let response = reply(&dispatcher, &registry, Request::car_details("NOPE"));
    assert_eq!(response, Response::failure("This licence is not registered"));
}

#[test]
fn test_get_licence_starting_with() {
    let (dispatcher, registry) = setup();

    let response = reply(&dispatcher, &registry, Request::licences_starting_with("AB"));
    assert!(response.success);
    assert_eq!(plates(&response), vec!["ABC123", "ABD777"]);

    let response = reply(&dispatcher, &registry, Request::licences_starting_with("ZZ"));
    assert!(response.success);
    assert!(plates(&response).is_empty());
}

// =============================================================================
// Write Commands
// =============================================================================

#[test]
fn test_change_mileage() {
    let (dispatcher, registry) = setup();

    let response = reply(&dispatcher, &registry, Request::change_mileage("ABC123", 150));
    assert_eq!(response, Response::done());
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 150);

    let response = reply(&dispatcher, &registry, Request::change_mileage("ABC123", 50));
    assert_eq!(response, Response::failure("Cannot wind the odometer back"));
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 150);

    let response = reply(&dispatcher, &registry, Request::change_mileage("ABC123", -1));
    assert_eq!(response, Response::failure("Cannot set a negative mileage"));
}

#[test]
fn test_change_owner() {
    let (dispatcher, registry) = setup();

    let response = reply(&dispatcher, &registry, Request::change_owner("XYZ 1", "Dave"));
    assert_eq!(response, Response::done());
    assert_eq!(registry.get("XYZ 1").unwrap().owner(), "Dave");

    let response = reply(&dispatcher, &registry, Request::change_owner("XYZ 1", ""));
    assert_eq!(response, Response::failure("Cannot set an empty owner"));

    let response = reply(&dispatcher, &registry, Request::change_owner("NOPE", "Dave"));
    assert_eq!(response, Response::failure("This licence is not registered"));
}

#[test]
fn test_new_registration() {
    let (dispatcher, registry) = setup();

    let response = reply(
        &dispatcher,
        &registry,
        Request::new_registration("new 1", 5, 10, "Erin"),
    );
    assert_eq!(response, Response::done());
    assert_eq!(registry.get("NEW 1").unwrap().seats(), 5);

    let response = reply(
        &dispatcher,
        &registry,
        Request::new_registration("ABC123", 5, 10, "Erin"),
    );
    assert_eq!(response, Response::failure("Cannot register duplicate licence"));

    let response = reply(
        &dispatcher,
        &registry,
        Request::new_registration("NEW 2", 3, 10, "Erin"),
    );
    assert_eq!(response, Response::failure("Cannot register car with invalid seats"));

    let response = reply(&dispatcher, &registry, Request::new_registration("", 4, 0, "Erin"));
    assert_eq!(response, Response::failure("Cannot set an empty licence"));
}

// =============================================================================
// Control and Validation
// =============================================================================

#[test]
fn test_shutdown_is_a_control_outcome() {
    let (dispatcher, registry) = setup();
    assert_eq!(
        dispatcher.dispatch(&registry, &Request::shutdown()),
        Outcome::Shutdown
    );
    // The registry is unaffected
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_unknown_command() {
    let (dispatcher, registry) = setup();
    let response = reply(&dispatcher, &registry, Request::new("DELETE_CAR", vec![]));

    assert!(!response.success);
    assert_eq!(response.error_message(), Some("Unknown command: DELETE_CAR"));
}

#[test]
fn test_wrong_arity() {
    let (dispatcher, registry) = setup();
    let response = reply(&dispatcher, &registry, Request::new("GET_CAR_DETAILS", vec![]));

    assert!(!response.success);
    assert!(response.error_message().unwrap().contains("expects 1 argument(s), got 0"));
}

#[test]
fn test_wrong_argument_type() {
    let (dispatcher, registry) = setup();
    let request = Request::new(
        "CHANGE_MILEAGE",
        vec![Value::Text("ABC123".into()), Value::Text("lots".into())],
    );
    let response = reply(&dispatcher, &registry, request);

    assert!(!response.success);
    assert!(response.error_message().unwrap().contains("must be an integer, got text"));
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 100);
}

#[test]
fn test_cars_list_ignores_extra_arguments() {
    let (dispatcher, registry) = setup();
    let request = Request::new("GET_CARS_LIST", vec![Value::Null]);
    assert!(reply(&dispatcher, &registry, request).success);
}
