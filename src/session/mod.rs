use log::{ debug, error, info };
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::context::PageContextTracker;
use crate::conversation::ConversationStore;
use crate::dispatcher::RequestDispatcher;
use crate::models::chat::{ HistoryEntry, Message, PageContext };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
}

/// Immutable view of a session, published after every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub conversation: ConversationStore,
}

impl SessionSnapshot {
    pub fn initial() -> Self {
        Self {
            phase: Phase::Idle,
            conversation: ConversationStore::seeded(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// The `n`-th (1-based) clickable suggestion, if any.
    pub fn suggestion(&self, n: usize) -> Option<&str> {
        let index = n.checked_sub(1)?;
        self.conversation.tail_suggestions().get(index).map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// Typed input or a clicked suggestion, with the page context current at
    /// the moment of submission.
    Submit {
        query: String,
        context: Option<PageContext>,
    },
    Resolved(Message),
}

/// Backend call requested by an accepted submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub query: String,
    pub history: Vec<HistoryEntry>,
    pub context: Option<PageContext>,
}

#[derive(Debug)]
pub struct Step {
    pub state: SessionSnapshot,
    pub dispatch: Option<Dispatch>,
    pub changed: bool,
}

impl Step {
    fn ignored(state: SessionSnapshot) -> Self {
        Self { state, dispatch: None, changed: false }
    }
}

pub fn transition(state: SessionSnapshot, event: SessionEvent) -> Step {
    match (state.phase, event) {
        (Phase::Idle, SessionEvent::Submit { query, context }) => {
            // The pending query travels as `message`, so it is not part of
            // the replayed history.
            let history = state.conversation.history();
            let mut conversation = state.conversation;
            if conversation.append_user_message(&query).is_err() {
                return Step::ignored(SessionSnapshot { conversation, ..state });
            }
            Step {
                state: SessionSnapshot {
                    phase: Phase::Sending,
                    conversation,
                },
                dispatch: Some(Dispatch { query, history, context }),
                changed: true,
            }
        }
        (Phase::Sending, SessionEvent::Resolved(message)) => {
            let mut conversation = state.conversation;
            conversation.append_assistant_message(message);
            Step {
                state: SessionSnapshot {
                    phase: Phase::Idle,
                    conversation,
                },
                dispatch: None,
                changed: true,
            }
        }
        (Phase::Sending, SessionEvent::Submit { .. }) | (Phase::Idle, SessionEvent::Resolved(_)) => {
            Step::ignored(state)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or a request was already in flight.
    Rejected,
    /// The request ran to completion and its reply was appended.
    Answered,
}

struct SessionInner {
    id: Uuid,
    dispatcher: RequestDispatcher,
    tracker: Arc<PageContextTracker>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionInner {
    fn apply(&self, event: SessionEvent) -> Option<Dispatch> {
        let mut dispatch = None;
        self.state.send_if_modified(|state| {
            let step = transition(state.clone(), event);
            dispatch = step.dispatch;
            if step.changed {
                *state = step.state;
            }
            step.changed
        });
        dispatch
    }

    async fn resolve(&self, dispatch: Dispatch) {
        let reply = self.dispatcher.send(
            &dispatch.query,
            dispatch.history,
            dispatch.context.as_ref()
        ).await;
        self.apply(SessionEvent::Resolved(reply));
    }
}

/// Owns one conversation and runs its send/receive cycle, one request at a
/// time.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionInner>,
}

impl SessionController {
    pub fn new(dispatcher: RequestDispatcher, tracker: Arc<PageContextTracker>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::initial());
        let id = Uuid::new_v4();
        info!("Session {} created", id);
        Self {
            inner: Arc::new(SessionInner {
                id,
                dispatcher,
                tracker,
                state,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Starts page context tracking. Requires a tokio runtime.
    pub fn start(&self) {
        self.inner.tracker.start();
    }

    pub fn stop(&self) {
        self.inner.tracker.stop();
    }

    pub fn tracker(&self) -> &PageContextTracker {
        &self.inner.tracker
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Submits `query` unless it is blank or a request is already in flight.
    /// The request runs on its own task, so dropping the returned future does
    /// not abandon it.
    pub async fn submit(&self, query: &str) -> SubmitOutcome {
        let context = self.inner.tracker.current();
        let event = SessionEvent::Submit {
            query: query.to_string(),
            context,
        };
        let Some(dispatch) = self.inner.apply(event) else {
            debug!("Session {}: submit rejected", self.inner.id);
            return SubmitOutcome::Rejected;
        };

        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::spawn(async move { inner.resolve(dispatch).await }).await {
            error!("Session {}: request task failed: {}", self.inner.id, e);
        }
        SubmitOutcome::Answered
    }

    pub async fn click_suggestion(&self, text: &str) -> SubmitOutcome {
        self.submit(text).await
    }
}
