//! Form binding and validation.
//!
//! Field rules are declared with `validator`; checks that need the database
//! (does the group exist, is the username taken) run in `bind`. Errors end
//! up in a [`FormErrors`] the templates render next to each field.
use std::borrow::Cow;
use std::collections::BTreeMap;

use sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::entities::{group, post};
use crate::store::{self, PostInput};

pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = match &err.message {
                    Some(message) => message.to_string(),
                    None => err.code.to_string(),
                };
                out.add(&field, message);
            }
        }
        out
    }
}

fn collect_errors(result: Result<(), ValidationErrors>) -> FormErrors {
    result.err().map(FormErrors::from).unwrap_or_default()
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Outcome of binding a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound<T> {
    Valid(T),
    Invalid(FormErrors),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Id of the chosen group as submitted; empty means no group.
    #[serde(default)]
    pub group: Option<String>,
}

impl PostForm {
    /// Form pre-filled from an existing post.
    pub fn from_post(post: &post::Model) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            group: self
                .group
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
        }
    }

    /// Validate the submission; returns the normalized form for
    /// redisplay together with the outcome.
    pub async fn bind(&self, db: &DatabaseConnection) -> Result<(Self, Bound<PostInput>), DbErr> {
        let form = self.normalized();
        let mut errors = collect_errors(form.validate());

        let mut group_id = None;
        if let Some(raw) = form.group.as_deref() {
            match raw.parse::<i32>() {
                Ok(id) if store::find_group(db, id).await?.is_some() => group_id = Some(id),
                _ => errors.add("group", INVALID_CHOICE),
            }
        }

        let bound = if errors.is_empty() {
            Bound::Valid(PostInput {
                text: form.text.clone(),
                group_id,
            })
        } else {
            Bound::Invalid(errors)
        };
        Ok((form, bound))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupChoice {
    pub id: i32,
    pub title: String,
    pub selected: bool,
}

/// Options of the group `<select>`, marking the one `selected` names.
pub fn group_choices(groups: &[group::Model], selected: Option<&str>) -> Vec<GroupChoice> {
    groups
        .iter()
        .map(|g| GroupChoice {
            id: g.id,
            title: g.title.clone(),
            selected: selected == Some(g.id.to_string().as_str()),
        })
        .collect()
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(field_error(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ))
    }
}

fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(field_error("invalid_email", "Enter a valid email address."))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of 1 to 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password: String,
    #[serde(default, skip_serializing)]
    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,
}

/// A signup that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub async fn bind(&self, db: &DatabaseConnection) -> Result<(Self, Bound<NewAccount>), DbErr> {
        let form = Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        };
        let mut errors = collect_errors(form.validate());

        if errors.field("username").is_empty()
            && store::find_user_by_username(db, &form.username)
                .await?
                .is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }

        let bound = if errors.is_empty() {
            Bound::Valid(NewAccount {
                username: form.username.clone(),
                email: form.email.clone(),
                password: form.password.clone(),
            })
        } else {
            Bound::Invalid(errors)
        };
        Ok((form, bound))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn errors(&self) -> FormErrors {
        collect_errors(self.validate())
    }
}
