//! Session commands.

use secrecy::SecretString;

use teeshop_core::{Email, UserPatch};
use teeshop_storefront::Storefront;
use teeshop_storefront::store::AuthState;

use crate::error::CliError;
use crate::output;

pub async fn login(shop: &Storefront, email: &Email, password: String) -> Result<(), CliError> {
    let user = shop
        .session()
        .login(email, &SecretString::from(password))
        .await?;
    output::success(&format!("Logged in as {}", user.name));
    Ok(())
}

pub async fn signup(
    shop: &Storefront,
    name: &str,
    email: &Email,
    password: String,
) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::InvalidArgument("Name is required".to_string()));
    }
    let user = shop
        .session()
        .signup(name.trim(), email, &SecretString::from(password))
        .await?;
    output::success(&format!("Welcome, {}!", user.name));
    Ok(())
}

pub async fn logout(shop: &Storefront) -> Result<(), CliError> {
    shop.session().logout().await?;
    output::success("Logged out");
    Ok(())
}

pub fn whoami(shop: &Storefront) {
    match shop.auth().state() {
        AuthState::Authenticated(session) => output::user(&session.user),
        AuthState::Anonymous | AuthState::Loading => output::success("Not logged in"),
    }
}

/// Without edits, refresh from the backend; otherwise save the edits.
pub async fn profile(
    shop: &Storefront,
    name: Option<String>,
    address: Option<String>,
) -> Result<(), CliError> {
    let patch = UserPatch {
        name,
        address,
        ..UserPatch::default()
    };
    let user = if patch.is_empty() {
        shop.session().refresh_profile().await?
    } else {
        shop.session().update_profile(patch).await?
    };
    output::user(&user);
    Ok(())
}
