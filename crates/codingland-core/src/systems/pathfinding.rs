//! Path requests - BFS searches bound to an actor on a map.
//!
//! A request is a future. Inline requests are fulfilled before they are
//! returned; queued requests are fulfilled when the scheduler drains its
//! queue at the start of the next tick. Either way the waiter sees a full
//! result, a failure result or a cancellation, never a partial path.

use codingland_logic::pathfinding::{lookup_path, LookupResult};
use codingland_logic::queue::StageQueue;
use codingland_logic::Vector;
use hecs::Entity;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use crate::error::{PathError, StageError};
use crate::map::ChunkRef;
use crate::stage::Stage;

/// Says whether a chunk blocks movement. `None` means "outside the map".
pub type Validator = Box<dyn Fn(Option<ChunkRef<'_>>) -> bool>;

pub type PathOutcome = Result<LookupResult, PathError>;

enum PathSlot {
    Pending(Option<Waker>),
    Done(PathOutcome),
}

/// Handle to a path search. Await it, or poll with [`try_result`](Self::try_result).
pub struct PathRequest {
    ticket: u64,
    owner: Entity,
    slot: Rc<RefCell<PathSlot>>,
}

impl PathRequest {
    fn pending(ticket: u64, owner: Entity) -> Self {
        Self {
            ticket,
            owner,
            slot: Rc::new(RefCell::new(PathSlot::Pending(None))),
        }
    }

    fn done(ticket: u64, owner: Entity, outcome: PathOutcome) -> Self {
        Self {
            ticket,
            owner,
            slot: Rc::new(RefCell::new(PathSlot::Done(outcome))),
        }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.borrow(), PathSlot::Pending(_))
    }

    /// The outcome, once there is one.
    pub fn try_result(&self) -> Option<PathOutcome> {
        match &*self.slot.borrow() {
            PathSlot::Pending(_) => None,
            PathSlot::Done(outcome) => Some(outcome.clone()),
        }
    }
}

impl Future for PathRequest {
    type Output = PathOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match &mut *slot {
            PathSlot::Pending(waker) => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
            PathSlot::Done(outcome) => Poll::Ready(outcome.clone()),
        }
    }
}

/// Settle a slot and wake its waiter. A settled slot keeps its first outcome.
fn fulfil(slot: &RefCell<PathSlot>, outcome: PathOutcome) {
    let waker = {
        let mut state = slot.borrow_mut();
        match std::mem::replace(&mut *state, PathSlot::Done(outcome)) {
            PathSlot::Pending(waker) => waker,
            PathSlot::Done(first) => {
                *state = PathSlot::Done(first);
                None
            }
        }
    };
    if let Some(waker) = waker {
        waker.wake();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Search now; the request is settled when returned.
    Inline,
    /// Search when the scheduler next runs.
    Queued,
}

struct QueuedSearch {
    owner: Entity,
    targets: Vec<Vector>,
    validator: Validator,
    slot: Weak<RefCell<PathSlot>>,
}

/// Run one search from `owner`'s position over its map.
pub fn search_path(
    stage: &Stage,
    owner: Entity,
    validator: &dyn Fn(Option<ChunkRef<'_>>) -> bool,
    targets: &[Vector],
) -> Result<LookupResult, StageError> {
    match stage.state(owner) {
        None => return Err(StageError::MissingNode(owner)),
        Some(crate::components::Lifecycle::Disposed) => return Err(StageError::Disposed(owner)),
        Some(_) => {}
    }
    let map = stage.map_of(owner).ok_or(StageError::NotOnMap(owner))?;
    let size = stage.map_size(map).ok_or(StageError::NotOnMap(owner))?;
    let start = stage
        .position(owner)
        .filter(|p| !p.is_empty())
        .ok_or(StageError::NotOnMap(owner))?;

    let result = lookup_path(size, start, targets, |cell| validator(stage.get_chunk(map, cell)));
    log::trace!(
        "Path search from {}: success={} steps={} expanded={}",
        start,
        result.success,
        result.steps(),
        result.stats.expanded
    );
    Ok(result)
}

/// FIFO of deferred searches.
pub struct PathScheduler {
    queue: StageQueue<QueuedSearch>,
    next_ticket: u64,
}

impl PathScheduler {
    pub fn new() -> Self {
        Self {
            queue: StageQueue::new(),
            next_ticket: 1,
        }
    }

    /// Start a search for `owner` toward the nearest of `targets`.
    pub fn request(
        &mut self,
        stage: &Stage,
        owner: Entity,
        targets: Vec<Vector>,
        validator: impl Fn(Option<ChunkRef<'_>>) -> bool + 'static,
        mode: SearchMode,
    ) -> PathRequest {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        match mode {
            SearchMode::Inline => {
                let outcome = search_path(stage, owner, &validator, &targets).map_err(PathError::from);
                PathRequest::done(ticket, owner, outcome)
            }
            SearchMode::Queued => {
                let request = PathRequest::pending(ticket, owner);
                self.queue.push(QueuedSearch {
                    owner,
                    targets,
                    validator: Box::new(validator),
                    slot: Rc::downgrade(&request.slot),
                });
                request
            }
        }
    }

    /// Fulfil every queued search. Searches whose request was dropped are
    /// skipped. Returns how many searches ran.
    pub fn run_pending(&mut self, stage: &Stage) -> usize {
        let mut ran = 0;
        for search in self.queue.drain().collect::<Vec<_>>() {
            let Some(slot) = search.slot.upgrade() else {
                continue;
            };
            let outcome = search_path(stage, search.owner, &*search.validator, &search.targets)
                .map_err(PathError::from);
            fulfil(&slot, outcome);
            ran += 1;
        }
        ran
    }

    /// Cancel every queued search owned by `owner`.
    pub fn cancel_for(&mut self, owner: Entity) -> usize {
        let mut cancelled = 0;
        let searches: Vec<QueuedSearch> = self.queue.drain().collect();
        for search in searches {
            if search.owner == owner {
                if let Some(slot) = search.slot.upgrade() {
                    fulfil(&slot, Err(PathError::Cancelled));
                }
                cancelled += 1;
            } else {
                self.queue.push(search);
            }
        }
        if cancelled > 0 {
            log::debug!("Cancelled {} path request(s) for {:?}", cancelled, owner);
        }
        cancelled
    }

    /// Cancel every queued search, whoever owns it.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for search in self.queue.drain().collect::<Vec<_>>() {
            if let Some(slot) = search.slot.upgrade() {
                fulfil(&slot, Err(PathError::Cancelled));
            }
            cancelled += 1;
        }
        if cancelled > 0 {
            log::debug!("Cancelled {} pending path request(s)", cancelled);
        }
        cancelled
    }

    /// Searches waiting for the next run.
    pub fn pending(&self) -> usize {
        self.queue.size()
    }
}

impl Default for PathScheduler {
    fn default() -> Self {
        Self::new()
    }
}
