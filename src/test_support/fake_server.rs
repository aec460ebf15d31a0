//! In-memory model of the OCS provisioning endpoints.
//!
//! The fake answers the same routes as the real server for a local and a
//! remote instance, distinguished by host. Failures are reported with an
//! HTTP error status for both API versions, so callers see a non-2xx status
//! wherever the real server might answer 200 with a failing OCS code.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use quick_xml::escape::escape;
use reqwest::Url;

use crate::provisioning::Provisioning;
use crate::session::{Accounts, ServerContext, Session};
use crate::transport::{ApiRequest, ApiResponse, Credentials, Method, Transport, TransportError};

/// Base URL that routes to the fake's local instance.
pub const LOCAL_BASE_URL: &str = "http://local.test/ocs/";
/// Base URL that routes to the fake's remote instance.
pub const REMOTE_BASE_URL: &str = "http://remote.test/ocs/";

const LOCAL_HOST: &str = "local.test";
const REMOTE_HOST: &str = "remote.test";
const DEFAULT_USER_PASSWORD: &str = "123456";
const DEFAULT_QUOTA: &str = "default";

#[derive(Clone, Debug)]
struct FakeUser {
    name: String,
    password: String,
    enabled: bool,
    quota: String,
    groups: Vec<String>,
    subadmin_of: Vec<String>,
}

impl FakeUser {
    fn new(name: &str, password: &str) -> Self {
        Self {
            name: name.to_owned(),
            password: password.to_owned(),
            enabled: true,
            quota: DEFAULT_QUOTA.to_owned(),
            groups: Vec::new(),
            subadmin_of: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct Instance {
    users: Vec<FakeUser>,
    groups: Vec<String>,
    enabled_apps: Vec<String>,
    disabled_apps: Vec<String>,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            groups: Vec::new(),
            enabled_apps: Vec::from(["dav", "files", "provisioning_api"].map(String::from)),
            disabled_apps: vec![String::from("testing")],
        }
    }
}

impl Instance {
    fn user(&self, name: &str) -> Option<&FakeUser> {
        self.users.iter().find(|user| user.name == name)
    }

    fn user_mut(&mut self, name: &str) -> Option<&mut FakeUser> {
        self.users.iter_mut().find(|user| user.name == name)
    }

    fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|group| group == name)
    }

    fn members_of(&self, group: &str) -> Vec<String> {
        self.users
            .iter()
            .filter(|user| user.groups.iter().any(|candidate| candidate == group))
            .map(|user| user.name.clone())
            .collect()
    }

    fn subadmins_of(&self, group: &str) -> Vec<String> {
        self.users
            .iter()
            .filter(|user| user.subadmin_of.iter().any(|candidate| candidate == group))
            .map(|user| user.name.clone())
            .collect()
    }
}

#[derive(Debug, Default)]
struct State {
    local: Instance,
    remote: Instance,
    failing_deletes: BTreeSet<String>,
    unreachable: bool,
    requests: Vec<ApiRequest>,
}

impl State {
    const fn instance(&self, server: ServerContext) -> &Instance {
        match server {
            ServerContext::Local => &self.local,
            ServerContext::Remote => &self.remote,
        }
    }

    const fn instance_mut(&mut self, server: ServerContext) -> &mut Instance {
        match server {
            ServerContext::Local => &mut self.local,
            ServerContext::Remote => &mut self.remote,
        }
    }
}

/// Who sent a request, after checking its basic-auth credentials.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Caller {
    Admin,
    User(String),
}

/// Shared handle to an in-memory OCS server pair. Clones observe and mutate
/// the same state, so a test can keep one handle while the step executors
/// own another.
#[derive(Clone, Debug)]
pub struct FakeOcsServer {
    admin: Credentials,
    state: Rc<RefCell<State>>,
}

impl Default for FakeOcsServer {
    fn default() -> Self {
        Self::with_admin("admin", "admin")
    }
}

impl FakeOcsServer {
    /// Creates a fake whose administrator is `admin`/`admin`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake with custom administrator credentials.
    #[must_use]
    pub fn with_admin(username: &str, password: &str) -> Self {
        Self {
            admin: Credentials::new(username, password),
            state: Rc::new(RefCell::new(State::default())),
        }
    }

    /// Returns a password book matching this fake's administrator.
    #[must_use]
    pub fn accounts(&self) -> Accounts {
        Accounts::new(
            self.admin.username.clone(),
            self.admin.password.clone(),
            DEFAULT_USER_PASSWORD,
        )
    }

    /// Returns an admin session for the local instance only.
    #[must_use]
    pub fn local_session(&self, api_version: u8) -> Session {
        Session::new(self.admin.username.clone(), LOCAL_BASE_URL, None, api_version)
    }

    /// Returns an admin session that also knows the remote instance.
    #[must_use]
    pub fn federated_session(&self, api_version: u8) -> Session {
        Session::new(
            self.admin.username.clone(),
            LOCAL_BASE_URL,
            Some(REMOTE_BASE_URL.to_owned()),
            api_version,
        )
    }

    /// Returns step executors wired to this fake, local instance only, on
    /// API version 1.
    #[must_use]
    pub fn provisioning(&self) -> Provisioning<Self> {
        Provisioning::new(self.clone(), self.local_session(1), self.accounts())
    }

    /// Returns step executors wired to both instances on API version 1.
    #[must_use]
    pub fn federated_provisioning(&self) -> Provisioning<Self> {
        Provisioning::new(self.clone(), self.federated_session(1), self.accounts())
    }

    /// Adds a user directly, bypassing the API.
    pub fn seed_user(&self, server: ServerContext, name: &str, password: &str) {
        let mut state = self.state.borrow_mut();
        let instance = state.instance_mut(server);
        if instance.user(name).is_none() {
            instance.users.push(FakeUser::new(name, password));
        }
    }

    /// Adds a group directly, bypassing the API.
    pub fn seed_group(&self, server: ServerContext, name: &str) {
        let mut state = self.state.borrow_mut();
        let instance = state.instance_mut(server);
        if !instance.has_group(name) {
            instance.groups.push(name.to_owned());
        }
    }

    /// Adds `user` to `group` directly. Both must already exist.
    pub fn seed_membership(&self, server: ServerContext, user: &str, group: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.instance_mut(server).user_mut(user) {
            entry.groups.push(group.to_owned());
        }
    }

    /// Returns `true` when `name` exists on `server`.
    #[must_use]
    pub fn has_user(&self, server: ServerContext, name: &str) -> bool {
        self.state.borrow().instance(server).user(name).is_some()
    }

    /// Returns `true` when `name` exists on `server`.
    #[must_use]
    pub fn has_group(&self, server: ServerContext, name: &str) -> bool {
        self.state.borrow().instance(server).has_group(name)
    }

    /// Returns the groups of `user` in the order they were joined.
    #[must_use]
    pub fn groups_of(&self, server: ServerContext, user: &str) -> Vec<String> {
        self.state
            .borrow()
            .instance(server)
            .user(user)
            .map(|entry| entry.groups.clone())
            .unwrap_or_default()
    }

    /// Returns the users holding subadmin rights over `group`.
    #[must_use]
    pub fn subadmins_of(&self, server: ServerContext, group: &str) -> Vec<String> {
        self.state.borrow().instance(server).subadmins_of(group)
    }

    /// Returns whether `user` is enabled, or `None` when absent.
    #[must_use]
    pub fn is_enabled(&self, server: ServerContext, user: &str) -> Option<bool> {
        self.state
            .borrow()
            .instance(server)
            .user(user)
            .map(|entry| entry.enabled)
    }

    /// Returns the quota of `user`, or `None` when absent.
    #[must_use]
    pub fn quota_of(&self, server: ServerContext, user: &str) -> Option<String> {
        self.state
            .borrow()
            .instance(server)
            .user(user)
            .map(|entry| entry.quota.clone())
    }

    /// Makes every deletion of a user or group called `name` answer 500.
    pub fn fail_deletes_of(&self, name: &str) {
        self.state
            .borrow_mut()
            .failing_deletes
            .insert(name.to_owned());
    }

    /// Makes every request fail before a status is produced.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.borrow_mut().unreachable = unreachable;
    }

    /// Returns a snapshot of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    /// Forgets the recorded requests.
    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }

    fn authenticate(&self, instance: &Instance, request: &ApiRequest) -> Option<Caller> {
        let credentials = request.credentials.as_ref()?;
        if credentials.username == self.admin.username
            && credentials.password == self.admin.password
        {
            return Some(Caller::Admin);
        }
        instance
            .user(&credentials.username)
            .filter(|user| user.enabled && user.password == credentials.password)
            .map(|user| Caller::User(user.name.clone()))
    }
}

impl Transport for FakeOcsServer {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let refused = |message: &str| TransportError::Request {
            method: request.method,
            url: request.url.clone(),
            message: message.to_owned(),
        };
        let mut guard = self.state.borrow_mut();
        let State {
            local,
            remote,
            failing_deletes,
            unreachable,
            requests,
        } = &mut *guard;
        requests.push(request.clone());
        if *unreachable {
            return Err(refused("connection refused"));
        }
        let url = Url::parse(&request.url).map_err(|err| refused(&err.to_string()))?;
        let server = match url.host_str() {
            Some(LOCAL_HOST) => ServerContext::Local,
            Some(REMOTE_HOST) => ServerContext::Remote,
            _ => return Err(refused("unknown host")),
        };
        let Some((version, segments)) = route_of(&url) else {
            return Ok(failure(404, 998, "unknown endpoint"));
        };
        let instance = match server {
            ServerContext::Local => local,
            ServerContext::Remote => remote,
        };
        let Some(caller) = self.authenticate(instance, request) else {
            return Ok(failure(401, 997, "unauthorised"));
        };
        let exchange = Exchange {
            request,
            url: &url,
            version,
            caller,
            failing_deletes,
        };
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
        Ok(match parts.as_slice() {
            ["users", rest @ ..] => exchange.users(instance, rest),
            ["groups", rest @ ..] => exchange.groups(instance, rest),
            ["apps"] => exchange.apps(instance),
            _ => failure(404, 998, "unknown endpoint"),
        })
    }
}

/// One request being answered by an instance.
struct Exchange<'a> {
    request: &'a ApiRequest,
    url: &'a Url,
    version: u8,
    caller: Caller,
    failing_deletes: &'a BTreeSet<String>,
}

impl Exchange<'_> {
    fn is_admin(&self) -> bool {
        self.caller == Caller::Admin
    }

    fn is_admin_or(&self, user: &str) -> bool {
        match &self.caller {
            Caller::Admin => true,
            Caller::User(name) => name == user,
        }
    }

    fn field(&self, key: &str) -> &str {
        self.request.field(key).unwrap_or_default()
    }

    fn ok(&self, data: &str) -> ApiResponse {
        let code = if self.version == 1 { 100 } else { 200 };
        ApiResponse::new(200, envelope("ok", code, "OK", data))
    }

    fn users(&self, instance: &mut Instance, rest: &[&str]) -> ApiResponse {
        let method = self.request.method;
        if !matches!((method, rest), (Method::Get, [_] | [_, "groups"])) && !self.is_admin() {
            return failure(403, 997, "forbidden");
        }
        match (method, rest) {
            (Method::Get, []) => {
                let names: Vec<String> =
                    instance.users.iter().map(|user| user.name.clone()).collect();
                self.ok(&container("users", &names))
            }
            (Method::Post, []) => self.create_user(instance),
            (Method::Get, [user]) => self.user_info(instance, user),
            (Method::Put, [user]) => self.edit_user(instance, user),
            (Method::Delete, [user]) => self.delete_user(instance, user),
            (Method::Put, [user, "enable"]) => self.set_enabled(instance, user, true),
            (Method::Put, [user, "disable"]) => self.set_enabled(instance, user, false),
            (Method::Get, [user, "groups"]) => match instance.user(user) {
                Some(entry) if self.is_admin_or(user) => {
                    self.ok(&container("groups", &entry.groups))
                }
                Some(_) => failure(403, 997, "forbidden"),
                None => failure(404, 998, "user does not exist"),
            },
            (Method::Post, [user, "groups"]) => self.join_group(instance, user),
            (Method::Delete, [user, "groups"]) => self.leave_group(instance, user),
            (Method::Get, [user, "subadmins"]) => match instance.user(user) {
                Some(entry) => self.ok(&elements(&entry.subadmin_of)),
                None => failure(404, 998, "user does not exist"),
            },
            (Method::Post, [user, "subadmins"]) => self.grant_subadmin(instance, user),
            (Method::Delete, [user, "subadmins"]) => self.revoke_subadmin(instance, user),
            _ => failure(404, 998, "unknown endpoint"),
        }
    }

    fn groups(&self, instance: &mut Instance, rest: &[&str]) -> ApiResponse {
        if !self.is_admin() {
            return failure(403, 997, "forbidden");
        }
        match (self.request.method, rest) {
            (Method::Get, []) => self.ok(&container("groups", &instance.groups)),
            (Method::Post, []) => {
                let group = self.field("groupid");
                if group.is_empty() || instance.has_group(group) {
                    return failure(400, 102, "group exists");
                }
                instance.groups.push(group.to_owned());
                self.ok("")
            }
            (Method::Get, [group]) if instance.has_group(group) => {
                self.ok(&container("users", &instance.members_of(group)))
            }
            (Method::Delete, [group]) if instance.has_group(group) => {
                if self.failing_deletes.contains(*group) {
                    return failure(500, 996, "internal error");
                }
                instance.groups.retain(|candidate| candidate != group);
                for user in &mut instance.users {
                    user.groups.retain(|candidate| candidate != group);
                    user.subadmin_of.retain(|candidate| candidate != group);
                }
                self.ok("")
            }
            (Method::Get, [group, "subadmins"]) if instance.has_group(group) => {
                self.ok(&elements(&instance.subadmins_of(group)))
            }
            (_, [_, ..]) => failure(404, 998, "group does not exist"),
            _ => failure(404, 998, "unknown endpoint"),
        }
    }

    fn apps(&self, instance: &Instance) -> ApiResponse {
        if self.request.method != Method::Get {
            return failure(405, 998, "method not allowed");
        }
        let filter = self
            .url
            .query_pairs()
            .find(|(key, _)| key == "filter")
            .map(|(_, value)| value.into_owned());
        let apps = match filter.as_deref() {
            Some("enabled") => instance.enabled_apps.clone(),
            Some("disabled") => instance.disabled_apps.clone(),
            _ => instance
                .enabled_apps
                .iter()
                .chain(&instance.disabled_apps)
                .cloned()
                .collect(),
        };
        self.ok(&container("apps", &apps))
    }

    fn create_user(&self, instance: &mut Instance) -> ApiResponse {
        let name = self.field("userid");
        let password = self.field("password");
        if name.is_empty() || password.is_empty() {
            return failure(400, 101, "userid and password are required");
        }
        if instance.user(name).is_some() {
            return failure(400, 102, "user already exists");
        }
        instance.users.push(FakeUser::new(name, password));
        self.ok("")
    }

    fn user_info(&self, instance: &Instance, name: &str) -> ApiResponse {
        if !self.is_admin_or(name) {
            return failure(403, 997, "forbidden");
        }
        let Some(user) = instance.user(name) else {
            return failure(404, 998, "user does not exist");
        };
        let data = format!(
            "<enabled>{}</enabled><email/><displayname>{name}</displayname>\
             <home>/var/www/owncloud/data/{name}</home>\
             <quota><definition>{quota}</definition><used>0</used></quota>",
            user.enabled,
            name = escape(user.name.as_str()),
            quota = escape(user.quota.as_str()),
        );
        self.ok(&data)
    }

    fn edit_user(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        let Some(user) = instance.user_mut(name) else {
            return failure(404, 998, "user does not exist");
        };
        match self.field("key") {
            "quota" => {
                self.field("value").clone_into(&mut user.quota);
                self.ok("")
            }
            "password" => {
                self.field("value").clone_into(&mut user.password);
                self.ok("")
            }
            _ => failure(400, 103, "unsupported key"),
        }
    }

    fn delete_user(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        if instance.user(name).is_none() {
            return failure(404, 998, "user does not exist");
        }
        if self.failing_deletes.contains(name) {
            return failure(500, 996, "internal error");
        }
        instance.users.retain(|user| user.name != name);
        self.ok("")
    }

    fn set_enabled(&self, instance: &mut Instance, name: &str, enabled: bool) -> ApiResponse {
        let Some(user) = instance.user_mut(name) else {
            return failure(404, 998, "user does not exist");
        };
        user.enabled = enabled;
        self.ok("")
    }

    fn join_group(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        let group = self.field("groupid");
        if !instance.has_group(group) {
            return failure(400, 102, "group does not exist");
        }
        let Some(user) = instance.user_mut(name) else {
            return failure(400, 103, "user does not exist");
        };
        if !user.groups.iter().any(|candidate| candidate == group) {
            user.groups.push(group.to_owned());
        }
        self.ok("")
    }

    fn leave_group(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        let group = self.field("groupid");
        if !instance.has_group(group) {
            return failure(400, 102, "group does not exist");
        }
        let Some(user) = instance.user_mut(name) else {
            return failure(400, 103, "user does not exist");
        };
        user.groups.retain(|candidate| candidate != group);
        self.ok("")
    }

    fn grant_subadmin(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        let group = self.field("groupid");
        if !instance.has_group(group) {
            return failure(400, 102, "group does not exist");
        }
        let Some(user) = instance.user_mut(name) else {
            return failure(400, 101, "user does not exist");
        };
        if !user.subadmin_of.iter().any(|candidate| candidate == group) {
            user.subadmin_of.push(group.to_owned());
        }
        self.ok("")
    }

    fn revoke_subadmin(&self, instance: &mut Instance, name: &str) -> ApiResponse {
        let group = self.field("groupid");
        let Some(user) = instance.user_mut(name) else {
            return failure(400, 101, "user does not exist");
        };
        if !user.subadmin_of.iter().any(|candidate| candidate == group) {
            return failure(400, 102, "user is not a subadmin of this group");
        }
        user.subadmin_of.retain(|candidate| candidate != group);
        self.ok("")
    }
}

/// Splits `/…/v{N}.php/cloud/{segments…}` into the version and the decoded
/// segments after `cloud`.
fn route_of(url: &Url) -> Option<(u8, Vec<String>)> {
    let segments: Vec<&str> = url.path_segments()?.filter(|part| !part.is_empty()).collect();
    let position = segments.iter().position(|part| *part == "cloud")?;
    let version = segments
        .get(position.checked_sub(1)?)?
        .strip_prefix('v')?
        .strip_suffix(".php")?
        .parse()
        .ok()?;
    let rest = segments.get(position + 1..)?;
    Some((version, rest.iter().map(|part| decode_segment(part)).collect()))
}

fn decode_segment(segment: &str) -> String {
    let mut decoded = Vec::with_capacity(segment.len());
    let mut rest = segment.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        let escaped = (byte == b'%')
            .then(|| tail.get(..2))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        let (value, next) =
            escaped.map_or((byte, tail), |value| (value, tail.get(2..).unwrap_or_default()));
        decoded.push(value);
        rest = next;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn envelope(status: &str, code: u16, message: &str, data: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<ocs><meta><status>{status}</status>\
         <statuscode>{code}</statuscode><message>{}</message></meta>\
         <data>{data}</data></ocs>",
        escape(message)
    )
}

fn failure(status: u16, code: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, envelope("failure", code, message, ""))
}

fn elements(items: &[String]) -> String {
    items.iter().fold(String::new(), |mut out, item| {
        out.push_str("<element>");
        out.push_str(&escape(item.as_str()));
        out.push_str("</element>");
        out
    })
}

fn container(name: &str, items: &[String]) -> String {
    format!("<{name}>{}</{name}>", elements(items))
}
