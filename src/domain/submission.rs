use serde::{Deserialize, Deserializer};

use crate::domain::{ContactEmail, WebsiteUrl};

const MAX_BUSINESS_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_WEBSITE_LENGTH: usize = 200;
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Raw contact form fields as posted by the browser.
#[derive(Deserialize, Default, Debug)]
pub struct ContactData {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub business: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub website: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub message: String,
    /// Honeypot, hidden from humans.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub company: String,
}

// Non-string JSON values are treated as if the field were absent.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    })
}

#[derive(Debug)]
pub struct Submission {
    pub business: String,
    pub email: ContactEmail,
    pub website: Option<WebsiteUrl>,
    pub message: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Invalid submission.")]
    Spam,
    #[error("Business, email, and message are required.")]
    MissingFields,
    #[error("One or more fields are too long.")]
    TooLong,
    #[error("Please provide a valid email address.")]
    InvalidEmail,
    #[error("Please provide a valid website URL.")]
    InvalidWebsite,
}

impl Submission {
    pub fn parse(data: ContactData) -> Result<Submission, SubmissionError> {
        let business = data.business.trim();
        let email = data.email.trim().to_lowercase();
        let website = data.website.trim();
        let message = data.message.trim();

        if !data.company.trim().is_empty() {
            return Err(SubmissionError::Spam);
        }

        if business.is_empty() || email.is_empty() || message.is_empty() {
            return Err(SubmissionError::MissingFields);
        }

        let is_too_long = business.chars().count() > MAX_BUSINESS_LENGTH
            || email.chars().count() > MAX_EMAIL_LENGTH
            || website.chars().count() > MAX_WEBSITE_LENGTH
            || message.chars().count() > MAX_MESSAGE_LENGTH;
        if is_too_long {
            return Err(SubmissionError::TooLong);
        }

        let email = ContactEmail::parse(email).map_err(|_| SubmissionError::InvalidEmail)?;

        let website = if website.is_empty() {
            None
        } else {
            Some(WebsiteUrl::parse(website.to_string()).map_err(|_| SubmissionError::InvalidWebsite)?)
        };

        Ok(Submission {
            business: business.to_string(),
            email,
            website,
            message: message.to_string(),
        })
    }
}

impl TryFrom<ContactData> for Submission {
    type Error = SubmissionError;

    fn try_from(data: ContactData) -> Result<Self, Self::Error> {
        Submission::parse(data)
    }
}
