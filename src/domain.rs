mod contact_email;
mod submission;
mod website_url;

pub use contact_email::ContactEmail;
pub use submission::{ContactData, Submission, SubmissionError};
pub use website_url::WebsiteUrl;
