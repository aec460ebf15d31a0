//! Exercises the reqwest transport against a wiremock server.
//!
//! The transport blocks on its own runtime, so each test drives wiremock on a
//! separate runtime and calls the transport outside of it.

use ocs_provisioning::{
    Accounts, ApiRequest, Credentials, HttpTransport, Method, Provisioning, Session, Transport,
    TransportError,
};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use wiremock::matchers::{basic_auth, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUPS_BODY: &str = "<?xml version=\"1.0\"?>\
<ocs><meta><status>ok</status><statuscode>100</statuscode><message/></meta>\
<data><groups><element>sales</element><element>finance</element></groups></data></ocs>";

#[fixture]
fn runtime() -> Runtime {
    Runtime::new().expect("test runtime")
}

fn mount(runtime: &Runtime, server: &MockServer, mock: Mock) {
    runtime.block_on(mock.mount(server));
}

#[rstest]
fn sends_form_fields_with_basic_auth(runtime: Runtime) {
    let server = runtime.block_on(MockServer::start());
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/ocs/v1.php/cloud/users"))
            .and(basic_auth("admin", "admin"))
            .and(body_string_contains("userid=alice"))
            .and(body_string_contains("password=123456"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ocs/>"))
            .expect(1),
    );

    let transport = HttpTransport::new().expect("transport");
    let request = ApiRequest::new(Method::Post, format!("{}/ocs/v1.php/cloud/users", server.uri()))
        .with_credentials(Credentials::new("admin", "admin"))
        .with_field("userid", "alice")
        .with_field("password", "123456");

    let response = transport.send(&request).expect("request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<ocs/>");
}

#[rstest]
fn error_statuses_are_returned_not_raised(runtime: Runtime) {
    let server = runtime.block_on(MockServer::start());
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/cloud/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing")),
    );

    let transport = HttpTransport::new().expect("transport");
    let request = ApiRequest::new(
        Method::Get,
        format!("{}/ocs/v2.php/cloud/users/ghost", server.uri()),
    );

    let response = transport.send(&request).expect("a 404 is still a response");

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.body, "missing");
}

#[test]
fn unreachable_servers_raise_request_errors() {
    let transport = HttpTransport::new().expect("transport");
    let request = ApiRequest::new(Method::Get, "http://127.0.0.1:9/ocs/v2.php/cloud/users");

    let error = transport.send(&request).expect_err("nothing listens on port 9");

    assert!(
        matches!(error, TransportError::Request { method: Method::Get, .. }),
        "unexpected error: {error}"
    );
}

#[rstest]
fn provisioning_steps_run_over_http(runtime: Runtime) {
    let server = runtime.block_on(MockServer::start());
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/cloud/users/alice"))
            .and(basic_auth("admin", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ocs/>")),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/ocs/v1.php/cloud/groups"))
            .and(basic_auth("admin", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GROUPS_BODY)),
    );

    let transport = HttpTransport::new().expect("transport");
    let session = Session::new("admin", format!("{}/ocs/", server.uri()), None, 1);
    let mut steps = Provisioning::new(
        transport,
        session,
        Accounts::new("admin", "admin", "123456"),
    );

    assert!(steps.user_exists("alice").expect("lookup"));
    assert!(!steps.group_exists("sales").expect("unmatched paths answer 404"));

    steps.admin_lists_groups().expect("listing");
    steps.the_http_status_code_should_be(200).expect("status");
    steps.the_ocs_status_code_should_be(100).expect("ocs status");
    steps
        .the_groups_should_be(&[vec![String::from("sales")], vec![String::from("finance")]])
        .expect("groups in server order");
}
