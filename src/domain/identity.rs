//! Federated sign-in reconciliation.
//!
//! A verified identity-provider token is matched against local accounts in
//! two steps (by federated subject, then by email). The outcome tells the
//! caller whether to save an updated user or insert a new one.

use std::collections::HashSet;

use serde::Deserialize;

use super::user::{normalize_email, NewUser, User, UserRole};

/// Claims taken from a verified federated ID token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FederatedClaims {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
}

/// Emails that are granted the admin role on federated sign-in.
#[derive(Debug, Clone, Default)]
pub struct AdminEmails(HashSet<String>);

impl AdminEmails {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, email: &str) -> bool {
        self.0.contains(&normalize_email(email))
    }
}

/// Result of matching federated claims against local accounts.
#[derive(Debug, Clone)]
pub enum Reconciliation {
    /// The federated subject is already known; the user was refreshed.
    Existing(User),
    /// An account with the same email was found and the subject attached.
    Linked(User),
    /// No account matched; insert this one.
    Create(NewUser),
}

impl Reconciliation {
    pub fn kind(&self) -> &'static str {
        match self {
            Reconciliation::Existing(_) => "existing",
            Reconciliation::Linked(_) => "linked",
            Reconciliation::Create(_) => "created",
        }
    }
}

/// Decide what to do with a verified federated sign-in.
///
/// `by_uid` is the user found by federated subject, `by_email` the user
/// found by the claims' email. `by_uid` wins when both are present.
pub fn reconcile(
    claims: &FederatedClaims,
    by_uid: Option<User>,
    by_email: Option<User>,
    admins: &AdminEmails,
) -> Reconciliation {
    if let Some(mut user) = by_uid {
        refresh(&mut user, claims, admins);
        return Reconciliation::Existing(user);
    }

    if let Some(mut user) = by_email {
        user.firebase_uid = Some(claims.uid.clone());
        refresh(&mut user, claims, admins);
        return Reconciliation::Linked(user);
    }

    Reconciliation::Create(new_federated_user(claims, admins))
}

fn refresh(user: &mut User, claims: &FederatedClaims, admins: &AdminEmails) {
    if let Some(name) = non_empty(&claims.name) {
        user.display_name = name.to_string();
    }
    if let Some(picture) = non_empty(&claims.picture) {
        user.photo_url = picture.to_string();
    }
    if admins.contains(&user.email) && !user.role.is_admin() {
        tracing::info!(email = %user.email, "Promoting configured admin email");
        user.role = UserRole::Admin;
    }
    user.record_login();
}

fn new_federated_user(claims: &FederatedClaims, admins: &AdminEmails) -> NewUser {
    let email = normalize_email(&claims.email);
    let name = non_empty(&claims.name);
    let (first_name, last_name) = split_name(name.unwrap_or_default());
    let role = if admins.contains(&email) {
        UserRole::Admin
    } else {
        UserRole::User
    };

    NewUser {
        display_name: Some(name.map(str::to_string).unwrap_or_else(|| email.clone())),
        email,
        password_hash: None,
        firebase_uid: Some(claims.uid.clone()),
        first_name,
        last_name,
        phone: None,
        photo_url: non_empty(&claims.picture).unwrap_or_default().to_string(),
        role,
        email_verified: claims.email_verified,
    }
}

/// First word becomes the first name, the remainder the last name.
fn split_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or("User").to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    (first, last)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
