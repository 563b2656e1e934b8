use fleetsim_shared::{EventKind, Notification};

/// A notification waiting to be dispatched, optionally followed by another
/// one that is only scheduled once this one has been delivered.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub notification: Notification,
    pub then: Option<Box<Outbound>>,
}

impl Outbound {
    pub fn once(notification: Notification) -> Self {
        Self {
            notification,
            then: None,
        }
    }

    /// Chain `next` behind the last step of this one
    pub fn followed_by(mut self, next: Outbound) -> Self {
        match self.then.take() {
            Some(existing) => self.then = Some(Box::new(existing.followed_by(next))),
            None => self.then = Some(Box::new(next)),
        }
        self
    }

    pub fn kind(&self) -> EventKind {
        self.notification.kind()
    }

    /// Kinds in dispatch order, including chained steps
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds = vec![self.kind()];
        let mut next = self.then.as_deref();
        while let Some(step) = next {
            kinds.push(step.kind());
            next = step.then.as_deref();
        }
        kinds
    }
}
