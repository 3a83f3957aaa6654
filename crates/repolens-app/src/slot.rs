//! Request slots: at most one in-flight request per slot, each tagged with a
//! generation so late completions can be recognised and dropped.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ErrorScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    RepoTree,
    FileContent,
    Analysis,
    Snippet,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        Self::RepoTree,
        Self::FileContent,
        Self::Analysis,
        Self::Snippet,
    ];

    pub fn error_scope(self) -> ErrorScope {
        match self {
            Self::RepoTree => ErrorScope::Repository,
            Self::FileContent => ErrorScope::File,
            Self::Analysis => ErrorScope::Analysis,
            Self::Snippet => ErrorScope::Snippet,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RepoTree => "repository tree",
            Self::FileContent => "file content",
            Self::Analysis => "analysis",
            Self::Snippet => "snippet explanation",
        }
    }
}

/// Handle carried by one issued request.
#[derive(Debug, Clone)]
pub struct Ticket {
    slot: SlotKind,
    generation: u64,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn slot(&self) -> SlotKind {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug)]
struct ActiveRequest {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct RequestSlot {
    kind: SlotKind,
    next_generation: u64,
    active: Option<ActiveRequest>,
}

impl RequestSlot {
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            next_generation: 0,
            active: None,
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Cancels the current occupant, if any, and issues a fresh ticket.
    pub fn begin(&mut self) -> Ticket {
        self.cancel();
        self.next_generation += 1;

        let cancel = CancellationToken::new();
        self.active = Some(ActiveRequest {
            generation: self.next_generation,
            cancel: cancel.clone(),
        });

        Ticket {
            slot: self.kind,
            generation: self.next_generation,
            cancel,
        }
    }

    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                debug!(
                    slot = self.kind.label(),
                    generation = active.generation,
                    "request cancelled"
                );
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.slot == self.kind
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.generation == ticket.generation)
    }

    /// Releases the slot if `ticket` is its current occupant.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.active = None;
        true
    }

    pub fn in_flight(&self) -> bool {
        self.active.is_some()
    }
}

#[derive(Debug)]
pub struct Slots {
    repo_tree: RequestSlot,
    file_content: RequestSlot,
    analysis: RequestSlot,
    snippet: RequestSlot,
}

impl Default for Slots {
    fn default() -> Self {
        Self {
            repo_tree: RequestSlot::new(SlotKind::RepoTree),
            file_content: RequestSlot::new(SlotKind::FileContent),
            analysis: RequestSlot::new(SlotKind::Analysis),
            snippet: RequestSlot::new(SlotKind::Snippet),
        }
    }
}

impl Slots {
    pub fn get(&self, kind: SlotKind) -> &RequestSlot {
        match kind {
            SlotKind::RepoTree => &self.repo_tree,
            SlotKind::FileContent => &self.file_content,
            SlotKind::Analysis => &self.analysis,
            SlotKind::Snippet => &self.snippet,
        }
    }

    pub fn get_mut(&mut self, kind: SlotKind) -> &mut RequestSlot {
        match kind {
            SlotKind::RepoTree => &mut self.repo_tree,
            SlotKind::FileContent => &mut self.file_content,
            SlotKind::Analysis => &mut self.analysis,
            SlotKind::Snippet => &mut self.snippet,
        }
    }

    pub fn cancel(&mut self, kinds: &[SlotKind]) {
        for kind in kinds {
            self.get_mut(*kind).cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        self.cancel(&SlotKind::ALL);
    }

    pub fn in_flight(&self) -> Vec<SlotKind> {
        SlotKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).in_flight())
            .collect()
    }

    pub fn any_in_flight(&self) -> bool {
        SlotKind::ALL
            .iter()
            .any(|kind| self.get(*kind).in_flight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_cancels_previous_occupant() {
        let mut slot = RequestSlot::new(SlotKind::FileContent);
        let first = slot.begin();
        let second = slot.begin();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!slot.is_current(&first));
        assert!(slot.is_current(&second));
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn stale_ticket_cannot_finish_the_slot() {
        let mut slot = RequestSlot::new(SlotKind::RepoTree);
        let first = slot.begin();
        let second = slot.begin();

        assert!(!slot.finish(&first));
        assert!(slot.in_flight());
        assert!(slot.finish(&second));
        assert!(!slot.in_flight());
        assert!(!slot.finish(&second));
    }

    #[test]
    fn ticket_from_another_slot_is_never_current() {
        let mut repo = RequestSlot::new(SlotKind::RepoTree);
        let mut file = RequestSlot::new(SlotKind::FileContent);
        let repo_ticket = repo.begin();
        let _file_ticket = file.begin();

        assert_eq!(repo_ticket.generation(), 1);
        assert!(!file.is_current(&repo_ticket));
    }

    #[test]
    fn cancel_clears_occupant_and_fires_token() {
        let mut slot = RequestSlot::new(SlotKind::Analysis);
        let ticket = slot.begin();

        assert!(slot.cancel());
        assert!(ticket.is_cancelled());
        assert!(!slot.is_current(&ticket));
        assert!(!slot.cancel());
    }

    #[test]
    fn slots_are_independent_until_cancelled_together() {
        let mut slots = Slots::default();
        let repo = slots.get_mut(SlotKind::RepoTree).begin();
        let file = slots.get_mut(SlotKind::FileContent).begin();
        let analysis = slots.get_mut(SlotKind::Analysis).begin();

        slots.cancel(&[SlotKind::Analysis]);
        assert!(analysis.is_cancelled());
        assert!(!file.is_cancelled());
        assert_eq!(
            slots.in_flight(),
            vec![SlotKind::RepoTree, SlotKind::FileContent]
        );

        slots.cancel_all();
        assert!(repo.is_cancelled());
        assert!(file.is_cancelled());
        assert!(!slots.any_in_flight());
    }
}
