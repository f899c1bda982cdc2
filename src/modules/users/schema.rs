use serde::Deserialize;
use validator::Validate;

/// Partial profile update. Changing the password requires the current one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}
