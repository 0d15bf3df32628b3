use std::{
    fmt, mem,
    sync::{Mutex, PoisonError},
};

use crate::{
    entity::{self, Entity},
    status::{self, StatusClass},
    AttemptBudget, Endpoint, Method, RawResponse, ReqwestTransport, RequestDescriptor, Result,
    SessionError, SessionOptions, Transport, TransportOptions,
};

/// Principal and secret used to log in; immutable for the session's lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Request waiting to be dispatched. The caller's own request is borrowed;
/// login requests are built against the endpoint current at the time of the
/// 401 that triggered them.
enum Step {
    Caller,
    Login(RequestDescriptor),
}

/// HTTP session against a cookie-authenticated REST controller.
///
/// [`execute`](Self::execute) re-authenticates once per expired session,
/// follows host redirects (which stick for later calls), and stops after
/// [`SessionOptions::attempt_limit`] dispatches. Share it across tasks behind
/// an `Arc`; the endpoint lock is never held across a network call.
pub struct AuthenticatingSession<T = ReqwestTransport> {
    transport: T,
    endpoint: Mutex<Endpoint>,
    budget: AttemptBudget,
    credentials: Credentials,
    login_path: String,
    options: SessionOptions,
}

impl<T> fmt::Debug for AuthenticatingSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatingSession")
            .field(
                "endpoint",
                &*self.endpoint.lock().unwrap_or_else(PoisonError::into_inner),
            )
            .field("credentials", &self.credentials)
            .field("login_path", &self.login_path)
            .field("options", &self.options)
            .field("attempts", &self.budget.value())
            .finish()
    }
}

impl AuthenticatingSession<ReqwestTransport> {
    /// Creates a session over a [`ReqwestTransport`].
    pub fn connect(
        endpoint: &str,
        credentials: Credentials,
        login_path: impl Into<String>,
        transport_options: TransportOptions,
    ) -> Result<Self> {
        let endpoint = Endpoint::parse(endpoint)?;
        let transport =
            ReqwestTransport::new(transport_options).map_err(|err| SessionError::Transport {
                host: endpoint.to_string(),
                source: Box::new(err),
            })?;
        Ok(Self::new(transport, endpoint, credentials, login_path))
    }

    /// Creates a session from environment variables.
    ///
    /// Reads:
    /// - `REST_SESSION_URL` — controller endpoint, e.g. `https://nvp.example.org`
    /// - `REST_SESSION_USERNAME`
    /// - `REST_SESSION_PASSWORD`
    /// - `REST_SESSION_LOGIN_PATH` — e.g. `/ws.v1/login`
    ///
    /// Returns an error if any variable is missing or empty.
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = required_env("REST_SESSION_URL")?;
        let username = required_env("REST_SESSION_USERNAME")?;
        let password = required_env("REST_SESSION_PASSWORD")?;
        let login_path = required_env("REST_SESSION_LOGIN_PATH")?;
        Self::connect(
            &url,
            Credentials::new(username, password),
            login_path,
            TransportOptions::default(),
        )
        .map_err(|err| err.to_string())
    }
}

fn required_env(name: &str) -> std::result::Result<String, String> {
    let value =
        std::env::var(name).map_err(|_| format!("missing {name} environment variable"))?;
    if value.trim().is_empty() {
        return Err(format!("{name} is set but empty"));
    }
    Ok(value)
}

impl<T: Transport> AuthenticatingSession<T> {
    pub fn new(
        transport: T,
        endpoint: Endpoint,
        credentials: Credentials,
        login_path: impl Into<String>,
    ) -> Self {
        let options = SessionOptions::default();
        Self {
            transport,
            endpoint: Mutex::new(endpoint),
            budget: AttemptBudget::new(options.attempt_limit),
            credentials,
            login_path: login_path.into(),
            options,
        }
    }

    /// Applies the attempt limit and excerpt length; the attempt count restarts.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.budget = AttemptBudget::new(options.attempt_limit);
        self.options = options;
        self
    }

    /// Endpoint that the next dispatch will target.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dispatches held by calls currently in flight.
    pub fn attempts(&self) -> i64 {
        self.budget.value()
    }

    /// Clears the attempt count; slots still held by in-flight calls are forgiven.
    pub fn reset_attempts(&self) {
        self.budget.reset();
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes `request`, logging in and following redirects as needed.
    ///
    /// Only a `200` for the caller's own request ends the chain successfully.
    /// A login that succeeds hands control back to the request it
    /// interrupted; a second 401 in a row is terminal. The dispatches of a
    /// call count against the shared limit until the call returns, whatever
    /// its outcome, so failed calls never starve later ones.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let mut lease = self.budget.lease();
        let mut suspended: Vec<Step> = Vec::new();
        let mut current = Step::Caller;
        let mut previous: u16 = 0;
        let mut last_status: Option<u16> = None;

        loop {
            let endpoint = self.endpoint();
            let Some(attempt) = lease.try_acquire() else {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    "reached max attempt limit of {} for {request}",
                    self.budget.limit()
                );
                return Err(SessionError::RetryLimitExceeded {
                    limit: self.budget.limit(),
                    host: endpoint.to_string(),
                    last_status,
                });
            };

            let target = match &current {
                Step::Caller => request,
                Step::Login(login) => login,
            };

            #[cfg(feature = "tracing")]
            tracing::debug!("executing {target} against {endpoint} [attempt {attempt}]");
            #[cfg(not(feature = "tracing"))]
            let _ = attempt;

            let response = self.dispatch(&endpoint, target).await?;
            let code = response.status;
            last_status = Some(code);

            match status::classify(code) {
                StatusClass::Ok => match suspended.pop() {
                    Some(resume) => current = resume,
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::info!(
                            "successfully executed {request} against {endpoint} after {} attempts",
                            lease.taken()
                        );
                        return Ok(response);
                    }
                },
                StatusClass::Unauthorized => {
                    if status::is_unauthorized(previous) {
                        let detail =
                            entity::error_message(&response, self.options.max_excerpt_len);
                        #[cfg(feature = "tracing")]
                        tracing::error!("authentication against {endpoint} failed: {detail}");
                        return Err(SessionError::AuthenticationFailed {
                            host: endpoint.to_string(),
                            detail,
                        });
                    }
                    let login = self.login_request(&endpoint)?;
                    suspended.push(mem::replace(&mut current, Step::Login(login)));
                }
                StatusClass::Redirect => {
                    if status::is_redirect(previous) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("got two consecutive redirects for {target}");
                    }
                    let location = response.location();
                    let next = location
                        .and_then(|location| endpoint.resolve_location(location))
                        .ok_or_else(|| SessionError::InvalidRedirect {
                            status: code,
                            host: endpoint.to_string(),
                            location: location.map(ToOwned::to_owned),
                        })?;
                    #[cfg(feature = "tracing")]
                    tracing::debug!("redirecting session from {endpoint} to {next}");
                    self.redirect_to(next);
                }
                StatusClass::Other => {
                    return Err(SessionError::UnexpectedStatus {
                        status: code,
                        host: endpoint.to_string(),
                        status_line: response.status_line(),
                        excerpt: entity::error_excerpt(&response, self.options.max_excerpt_len),
                    });
                }
            }
            previous = code;
        }
    }

    /// Executes `request` and returns the body of the successful response.
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<Entity> {
        let response = self.execute(request).await?;
        Ok(entity::extract(response))
    }

    /// `GET path?params` against the current endpoint.
    pub async fn retrieve<I, K, V>(&self, path: &str, params: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = self
            .request(Method::Get, path)
            .params(params)
            .build()?;
        self.fetch(&request).await
    }

    /// `POST path` with a JSON payload.
    pub async fn create(&self, path: &str, json: impl Into<String>) -> Result<Entity> {
        let request = self.request(Method::Post, path).json_payload(json).build()?;
        self.fetch(&request).await
    }

    /// `PUT path` with a JSON payload.
    pub async fn update(&self, path: &str, json: impl Into<String>) -> Result<Entity> {
        let request = self.request(Method::Put, path).json_payload(json).build()?;
        self.fetch(&request).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<Entity> {
        let request = self.request(Method::Delete, path).build()?;
        self.fetch(&request).await
    }

    fn request(&self, method: Method, path: &str) -> crate::RequestBuilder {
        RequestDescriptor::builder()
            .method(method)
            .host(self.endpoint().host())
            .path(path)
    }

    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        request: &RequestDescriptor,
    ) -> Result<RawResponse> {
        let send = self.transport.send(endpoint, request);
        let sent = match request.timeout() {
            Some(deadline) => match tokio::time::timeout(deadline, send).await {
                Ok(result) => result,
                Err(elapsed) => Err(elapsed.into()),
            },
            None => send.await,
        };
        sent.map_err(|source| SessionError::Transport {
            host: endpoint.to_string(),
            source,
        })
    }

    fn login_request(&self, endpoint: &Endpoint) -> Result<RequestDescriptor> {
        RequestDescriptor::builder()
            .method(Method::Post)
            .host(endpoint.host())
            .path(self.login_path.as_str())
            .form_payload([
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .build()
    }

    fn redirect_to(&self, next: Endpoint) {
        *self.endpoint.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
