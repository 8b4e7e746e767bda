//! Public contact form.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SiteError};
use crate::model::{ContactMessage, RecordId};
use crate::store::ContentStore;

/// Values typed into the contact form.
///
/// All three fields are required; nothing else is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    /// Sender name.
    #[serde(default)]
    pub name: String,
    /// Sender email.
    #[serde(default)]
    pub email: String,
    /// Message body.
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Creates a filled-in form.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    /// Returns the first blank required field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    /// Returns `true` if every field is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }

    /// Resets every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Builds the message to store, stamped with the current time.
    #[must_use]
    pub fn to_draft(&self) -> ContactMessage {
        ContactMessage {
            id: RecordId::unassigned(),
            name: self.name.clone(),
            email: self.email.clone(),
            message: self.message.clone(),
            date: Utc::now(),
        }
    }

    /// Sends the form as one insert.
    ///
    /// On success the stored message is prepended to the mirror and the
    /// form is cleared. On failure the form keeps its values.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::FormIncomplete`] without contacting the remote
    /// store if a field is blank, or the insert error.
    pub async fn submit(&mut self, store: &ContentStore) -> Result<ContactMessage> {
        if let Some(field) = self.missing_field() {
            return Err(SiteError::FormIncomplete { field });
        }

        match store.create(self.to_draft()).await {
            Ok(stored) => {
                info!(id = %stored.id, "Contact message received");
                self.clear();
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "Contact message could not be sent");
                Err(e)
            }
        }
    }
}
