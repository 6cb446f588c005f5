use std::collections::HashSet;

use log::{debug, info};

use crate::error::AdminError;
use crate::model::MutationIntent;

/// Bookkeeping for the mutations of one list page.
///
/// The dispatcher never touches rows. A successful mutation only bumps
/// `refresh_version`, which the owner answers with a fresh list request.
#[derive(Debug, Default)]
pub struct MutationDispatcher {
    refresh_version: u64,
    pending: Option<MutationIntent>,
    in_flight: HashSet<String>,
}

impl MutationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_version(&self) -> u64 {
        self.refresh_version
    }

    /// Arm a confirmation for `intent`, replacing any earlier one
    pub fn arm(&mut self, intent: MutationIntent) -> Result<(), AdminError> {
        intent.check()?;
        debug!("armed confirmation: {}", intent.action);
        self.pending = Some(intent);
        Ok(())
    }

    pub fn pending(&self) -> Option<&MutationIntent> {
        self.pending.as_ref()
    }

    pub fn cancel(&mut self) -> Option<MutationIntent> {
        let cancelled = self.pending.take();
        if let Some(intent) = &cancelled {
            debug!("cancelled confirmation: {}", intent.action);
        }
        cancelled
    }

    /// Gate a mutation before it goes out.
    ///
    /// `confirmed` is true only when the intent comes from the armed
    /// confirmation; irreversible intents are refused otherwise.
    pub fn start(&mut self, intent: &MutationIntent, confirmed: bool) -> Result<(), AdminError> {
        intent.check()?;
        if intent.requires_confirmation {
            let armed = self
                .pending
                .as_ref()
                .is_some_and(|pending| pending == intent);
            if !(confirmed && armed) {
                return Err(AdminError::ConfirmationRequired {
                    action: intent.action.clone(),
                });
            }
        }
        if !self.in_flight.insert(intent.flight_key()) {
            return Err(AdminError::validation(format!(
                "Please wait, the {} is still being updated.",
                intent.resource
            )));
        }
        Ok(())
    }

    /// Settle a mutation the backend accepted; returns the new refresh version
    pub fn succeeded(&mut self, intent: &MutationIntent) -> u64 {
        self.in_flight.remove(&intent.flight_key());
        if self.pending.as_ref() == Some(intent) {
            self.pending = None;
        }
        self.refresh_version += 1;
        info!(
            "{} succeeded; refresh version {}",
            intent.action, self.refresh_version
        );
        self.refresh_version
    }

    /// Settle a failed mutation. An armed confirmation stays armed for a retry.
    pub fn failed(&mut self, intent: &MutationIntent) {
        self.in_flight.remove(&intent.flight_key());
    }

    pub fn is_in_flight(&self, intent: &MutationIntent) -> bool {
        self.in_flight.contains(&intent.flight_key())
    }
}
