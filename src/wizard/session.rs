// ABOUTME: Wizard session tracking and submission in-flight guard
// ABOUTME: Generation tickets let late network responses be recognized and dropped

use tracing::debug;

/// Identifies the wizard session a network call was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Submission {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    submission: Submission,
}

impl Session {
    /// Starts a new session. Tickets from earlier sessions become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.submission = Submission::Idle;
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    pub fn submission(&self) -> Submission {
        self.submission
    }

    pub fn in_flight(&self) -> bool {
        self.submission == Submission::InFlight
    }

    /// Marks a submission in flight. Returns `None` if one already is.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.in_flight() {
            debug!("Submission already in flight, ignoring");
            return None;
        }
        self.submission = Submission::InFlight;
        Some(self.ticket())
    }

    /// Records the outcome of a submission. Returns false, leaving state
    /// untouched, when the ticket belongs to an earlier session.
    pub fn settle(&mut self, ticket: Ticket, succeeded: bool) -> bool {
        if !self.is_current(ticket) {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "Discarding response from a closed wizard session"
            );
            return false;
        }
        self.submission = if succeeded {
            Submission::Succeeded
        } else {
            Submission::Failed
        };
        true
    }
}
