//! Login and registration for both roles.

use tracing::info;

use super::{FlowError, FlowResult, InFlight, ViewScope};
use crate::api::validation::{
    validate_confirm_password, validate_email, validate_name, validate_password,
    validate_required,
};
use crate::api::{ApiClient, ApiResult, FieldErrors};
use crate::guard::{landing_route, Route};
use crate::models::{AuthResponse, Faculty, Student};
use crate::session::{SessionError, SessionStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .check(validate_email(&self.email), "email", "Please enter a valid email address")
            .check(validate_required(&self.password), "password", "Password is required");
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .check(validate_name(&self.name), "name", "Name must be at least 2 characters")
            .check(validate_email(&self.email), "email", "Please enter a valid email address")
            .check(
                validate_password(&self.password),
                "password",
                "Password must be at least 6 characters",
            )
            .check(
                validate_confirm_password(&self.password, &self.confirm_password),
                "confirm_password",
                "Passwords do not match",
            );
        errors.finish()
    }
}

/// Runs login/registration round-trips and records the result in the
/// session. Returns where the user should land.
#[derive(Debug)]
pub struct AuthFlow {
    api: ApiClient,
    submitting: InFlight,
}

impl AuthFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            submitting: InFlight::new(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_active()
    }

    pub async fn login_student(&self, scope: &ViewScope, form: &LoginForm) -> FlowResult<Route> {
        form.validate()?;
        let _submitting = self.submitting.begin()?;
        let response: AuthResponse<Student> = self
            .authenticate(scope, self.api.login(&form.email, &form.password))
            .await?;

        let fully_registered = response.user.is_registered();
        self.finish(|session| session.login_student(response.user, fully_registered, response.access_token))
    }

    /// New students always start without a faculty and class.
    pub async fn register_student(&self, scope: &ViewScope, form: &RegisterForm) -> FlowResult<Route> {
        form.validate()?;
        let _submitting = self.submitting.begin()?;
        let response = self
            .authenticate(
                scope,
                self.api
                    .register_student(form.name.trim(), &form.email, &form.password),
            )
            .await?;

        self.finish(|session| session.login_student(response.user, false, response.access_token))
    }

    pub async fn login_faculty(&self, scope: &ViewScope, form: &LoginForm) -> FlowResult<Route> {
        form.validate()?;
        let _submitting = self.submitting.begin()?;
        let response: AuthResponse<Faculty> = self
            .authenticate(scope, self.api.login(&form.email, &form.password))
            .await?;

        let fully_registered = response.user.is_registered();
        self.finish(|session| session.login_faculty(response.user, fully_registered, response.access_token))
    }

    pub async fn register_faculty(&self, scope: &ViewScope, form: &RegisterForm) -> FlowResult<Route> {
        form.validate()?;
        let _submitting = self.submitting.begin()?;
        let response = self
            .authenticate(
                scope,
                self.api
                    .register_faculty(form.name.trim(), &form.email, &form.password),
            )
            .await?;

        self.finish(|session| session.login_faculty(response.user, false, response.access_token))
    }

    pub fn logout(&self) {
        self.api.session().logout();
    }

    /// Hold the session in `Authenticating` for the duration of `call`
    async fn authenticate<T>(
        &self,
        scope: &ViewScope,
        call: impl std::future::Future<Output = ApiResult<T>>,
    ) -> FlowResult<T> {
        let session = self.api.session();
        session.begin_authentication();
        let result = scope.call(call).await;
        if result.is_err() {
            session.abort_authentication();
        }
        result
    }

    fn finish(
        &self,
        establish: impl FnOnce(&SessionStore) -> Result<(), SessionError>,
    ) -> FlowResult<Route> {
        let session = self.api.session();
        if let Err(e) = establish(session) {
            session.abort_authentication();
            return Err(e.into());
        }

        let state = session.state();
        let active = state
            .session()
            .ok_or(FlowError::Session(SessionError::NoSession))?;
        info!(role = %active.identity.role(), "Signed in");
        Ok(landing_route(active))
    }
}
