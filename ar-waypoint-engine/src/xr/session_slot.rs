/// Identifies one session held by a [`SessionSlot`]. Closing the session makes
/// every epoch issued for it stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEpoch(u64);

/// Holds at most one platform session.
///
/// Asynchronous setup steps keep the [`SessionEpoch`] returned by
/// [`open`](Self::open) and check it after every await. Platform callbacks
/// registered for a session close it through the same epoch, so a late
/// callback of an old session cannot close a newer one.
#[derive(Debug)]
pub struct SessionSlot<T> {
    current: Option<T>,
    epoch: u64,
}

impl<T> Default for SessionSlot<T> {
    fn default() -> Self {
        Self {
            current: None,
            epoch: 0,
        }
    }
}

impl<T> SessionSlot<T> {
    /// Store `session` and return its epoch. Callers check
    /// [`is_open`](Self::is_open) first.
    pub fn open(&mut self, session: T) -> SessionEpoch {
        self.current = Some(session);
        SessionEpoch(self.epoch)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Whether `epoch` still refers to the open session.
    pub fn is_current(&self, epoch: SessionEpoch) -> bool {
        self.current.is_some() && self.epoch == epoch.0
    }

    /// Close the session `epoch` refers to. Returns `None` and leaves the slot
    /// untouched when the epoch is stale.
    pub fn close(&mut self, epoch: SessionEpoch) -> Option<T> {
        if !self.is_current(epoch) {
            return None;
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_invalidates_the_epoch() {
        let mut slot = SessionSlot::default();
        let epoch = slot.open("first");

        assert!(slot.is_current(epoch));
        assert_eq!(slot.close(epoch), Some("first"));
        assert!(!slot.is_open());
        assert!(!slot.is_current(epoch));
    }

    #[test]
    fn end_during_setup_leaves_setup_stale() {
        let mut slot = SessionSlot::default();
        let setup = slot.open("session");

        // The end callback fires while setup awaits a reference space.
        let on_end = setup;
        slot.close(on_end);

        assert!(!slot.is_current(setup));
        assert!(slot.get().is_none());
    }

    #[test]
    fn late_close_of_old_session_keeps_new_one() {
        let mut slot = SessionSlot::default();
        let old = slot.open("old");
        slot.close(old);
        let new = slot.open("new");

        assert_eq!(slot.close(old), None);
        assert!(slot.is_current(new));
        assert_eq!(slot.get(), Some(&"new"));
    }
}
