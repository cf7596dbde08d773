//! Request context passed into service operations.

/// Who is acting on a request.
///
/// Identity comes from an external identity provider; by the time a
/// request reaches the services it is reduced to a verified email, or
/// nothing for anonymous external uploaders arriving through a public
/// link.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Verified email of the authenticated principal, if any.
    pub principal_email: Option<String>,
}

impl RequestContext {
    /// Context for an authenticated principal.
    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            principal_email: Some(email.into()),
        }
    }

    /// Context for an anonymous external uploader.
    pub fn anonymous() -> Self {
        Self {
            principal_email: None,
        }
    }

    /// The principal's email, or a forbidden error for anonymous callers.
    pub fn require_email(&self) -> droplink_core::AppResult<&str> {
        self.principal_email
            .as_deref()
            .ok_or_else(|| droplink_core::AppError::forbidden("Authentication required"))
    }
}
