use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

/// Screen regions that can hold keyboard focus, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    SideNav,
    NoteList,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::SideNav, Region::NoteList];

    pub fn next(self) -> Self {
        match self {
            Region::SideNav => Region::NoteList,
            Region::NoteList => Region::SideNav,
        }
    }

    pub fn previous(self) -> Self {
        // two regions: previous and next coincide
        self.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMessage {
    Focus(Region),
    Unfocus(Region),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusState {
    pub side_nav: bool,
    pub note_list: bool,
}

impl Default for FocusState {
    fn default() -> Self {
        Self {
            side_nav: true,
            note_list: false,
        }
    }
}

impl FocusState {
    pub fn apply(&mut self, message: FocusMessage) {
        let (region, focused) = match message {
            FocusMessage::Focus(region) => (region, true),
            FocusMessage::Unfocus(region) => (region, false),
        };
        match region {
            Region::SideNav => self.side_nav = focused,
            Region::NoteList => self.note_list = focused,
        }
    }

    pub fn is_focused(&self, region: Region) -> bool {
        match region {
            Region::SideNav => self.side_nav,
            Region::NoteList => self.note_list,
        }
    }

    /// The focused region, preferring the sidebar if both claim focus.
    pub fn active(&self) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|region| self.is_focused(*region))
    }
}

/// Typed conduit for focus hand-offs between regions.
#[derive(Debug, Clone)]
pub struct FocusChannel {
    tx: Sender<FocusMessage>,
    rx: Receiver<FocusMessage>,
}

impl Default for FocusChannel {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }
}

impl FocusChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> Sender<FocusMessage> {
        self.tx.clone()
    }

    /// Queues the messages that move focus from `from` to `to`.
    pub fn hand_off(&self, from: Region, to: Region) {
        for message in [FocusMessage::Unfocus(from), FocusMessage::Focus(to)] {
            if self.tx.send(message).is_err() {
                tracing::warn!(?message, "focus channel closed, dropping message");
            }
        }
    }

    /// Applies every pending message to `state` and returns how many were seen.
    pub fn drain(&self, state: &mut FocusState) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    tracing::trace!(?message, "applying focus message");
                    state.apply(message);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reducer_tracks_each_region() {
        let mut state = FocusState::default();
        assert_eq!(state.active(), Some(Region::SideNav));
        state.apply(FocusMessage::Unfocus(Region::SideNav));
        assert_eq!(state.active(), None);
        state.apply(FocusMessage::Focus(Region::NoteList));
        assert!(state.is_focused(Region::NoteList));
        assert_eq!(state.active(), Some(Region::NoteList));
    }

    #[test]
    fn hand_off_moves_focus_once_drained() {
        let channel = FocusChannel::new();
        let mut state = FocusState::default();
        channel.hand_off(Region::SideNav, Region::NoteList);
        assert!(state.side_nav, "nothing applied before drain");

        assert_eq!(channel.drain(&mut state), 2);
        assert_eq!(
            state,
            FocusState {
                side_nav: false,
                note_list: true
            }
        );
        assert_eq!(channel.drain(&mut state), 0);
    }

    #[test]
    fn external_senders_share_the_queue() {
        let channel = FocusChannel::new();
        let sender = channel.sender();
        sender
            .send(FocusMessage::Focus(Region::NoteList))
            .expect("channel open");
        let mut state = FocusState::default();
        channel.drain(&mut state);
        assert!(state.note_list);
        assert!(state.side_nav);
    }

    #[test]
    fn regions_cycle() {
        assert_eq!(Region::SideNav.next(), Region::NoteList);
        assert_eq!(Region::NoteList.next(), Region::SideNav);
        assert_eq!(Region::NoteList.previous(), Region::SideNav);
    }
}
