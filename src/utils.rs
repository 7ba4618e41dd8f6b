use rocket::response::{Flash, Redirect};
use validator::ValidationErrors;

/// Redirects to the login page, remembering where the user wanted to go.
pub fn requires_login(message: &str, next: &str) -> Flash<Redirect> {
    Flash::error(
        Redirect::to(format!("/auth/login?next={}", next)),
        message,
    )
}

/// Flattens validator's error tree into displayable lines.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, error.code),
            })
        })
        .collect();
    messages.sort();
    messages
}
