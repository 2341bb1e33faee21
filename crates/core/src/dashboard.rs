//! Admin dashboard controller.
//!
//! [`Dashboard`] owns the application state and is driven by [`Msg`] values.
//! `update` never performs I/O; it returns [`Command`]s that
//! [`Dashboard::run_commands`] (or any other shell) executes, feeding the
//! results back as further messages. Rendering goes through the pure
//! functions in [`crate::view`].

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::cache::{ApplyOutcome, IssueCache};
use crate::filter::{CategoryFilter, IssueFilter, StatusFilter};
use crate::issue::{Issue, Status};
use crate::mutation::StatusUpdate;
use crate::session::{check_admin, sign_out, AdminSession, Gate, SessionStore};
use crate::stats::DEFAULT_TIMELINE_DAYS;
use crate::store::{IssueStore, Snapshot};
use crate::types::{IssueId, Timestamp};
use crate::view::{self, AnalyticsView, IssueDetail, MapView, OverviewView, TableView};

pub const LOAD_FAILED_NOTICE: &str = "Error loading issues. Please refresh the page.";
pub const QUICK_UPDATE_OK_NOTICE: &str = "Status updated successfully!";
pub const QUICK_UPDATE_FAILED_NOTICE: &str = "Error updating status. Please try again.";
pub const MODAL_UPDATE_FAILED_NOTICE: &str = "Error updating issue. Please try again.";

/// Top-level page of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Overview,
    Issues,
    Map,
    Analytics,
}

/// Which control started a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Row action in the issues table; confirmed first.
    Table,
    /// Detail modal; dispatched directly, closes the modal on success.
    Modal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Inputs to the controller.
#[derive(Debug, Clone)]
pub enum Msg {
    SnapshotReceived(Arc<Snapshot>),
    SnapshotFailed(String),
    /// The live feed reconnected; the next snapshot starts a new revision
    /// sequence.
    FeedReconnected,
    SetStatusFilter(StatusFilter),
    SetCategoryFilter(CategoryFilter),
    SetSearch(String),
    OpenDetail(IssueId),
    CloseDetail,
    QuickStatus { id: IssueId, status: Status },
    Confirmed(bool),
    ModalStatus(Status),
    UpdateSucceeded { id: IssueId, status: Status, origin: UpdateOrigin },
    UpdateFailed { id: IssueId, error: String, origin: UpdateOrigin },
    SwitchView(View),
    Logout,
}

/// Effects requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Confirm { prompt: String },
    Dispatch { id: IssueId, update: StatusUpdate, origin: UpdateOrigin },
    Notify(Notice),
    Redirect { notice: Option<&'static str>, to: &'static str },
}

/// Effects that need the outside world.
#[async_trait]
pub trait Shell: Send {
    async fn confirm(&mut self, prompt: &str) -> bool;
    fn notify(&mut self, notice: &Notice);
    fn redirect(&mut self, to: &str);
}

pub struct Dashboard {
    session: Arc<dyn SessionStore>,
    admin: AdminSession,
    cache: IssueCache,
    filter: IssueFilter,
    view: View,
    open_detail: Option<IssueId>,
    pending_confirm: Option<(IssueId, Status)>,
    last_notice: Option<Notice>,
}

impl Dashboard {
    /// Open the dashboard if the session carries an admin identity;
    /// otherwise return the login redirect.
    pub fn open(session: Arc<dyn SessionStore>) -> Result<Self, Command> {
        match check_admin(session.as_ref()) {
            Gate::Granted(admin) => Ok(Self {
                session,
                admin,
                cache: IssueCache::new(),
                filter: IssueFilter::default(),
                view: View::default(),
                open_detail: None,
                pending_confirm: None,
                last_notice: None,
            }),
            Gate::Redirect { notice, to } => Err(Command::Redirect {
                notice: Some(notice),
                to,
            }),
        }
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        self.update_at(msg, Utc::now())
    }

    /// Process one message; `now` stamps any status change it produces.
    pub fn update_at(&mut self, msg: Msg, now: Timestamp) -> Vec<Command> {
        match msg {
            Msg::SnapshotReceived(snapshot) => {
                if let ApplyOutcome::Stale { current, delivered } = self.cache.apply(snapshot) {
                    tracing::debug!(current, delivered, "Dropped out-of-order snapshot");
                }
                Vec::new()
            }
            Msg::SnapshotFailed(error) => {
                tracing::error!(error = %error, "Error loading issues");
                self.notify(Notice::error(LOAD_FAILED_NOTICE))
            }
            Msg::FeedReconnected => {
                self.cache.reset();
                Vec::new()
            }
            Msg::SetStatusFilter(status) => {
                self.filter.status = status;
                Vec::new()
            }
            Msg::SetCategoryFilter(category) => {
                self.filter.category = category;
                Vec::new()
            }
            Msg::SetSearch(search) => {
                self.filter.search = search;
                Vec::new()
            }
            Msg::OpenDetail(id) => {
                if self.cache.find(&id).is_some() {
                    self.open_detail = Some(id);
                }
                Vec::new()
            }
            Msg::CloseDetail => {
                self.open_detail = None;
                Vec::new()
            }
            Msg::QuickStatus { id, status } => {
                let prompt = format!("Mark this issue as {}?", status.label());
                self.pending_confirm = Some((id, status));
                vec![Command::Confirm { prompt }]
            }
            Msg::Confirmed(accepted) => match self.pending_confirm.take() {
                Some((id, status)) if accepted => {
                    vec![self.dispatch(id, status, UpdateOrigin::Table, now)]
                }
                _ => Vec::new(),
            },
            Msg::ModalStatus(status) => match self.open_detail.clone() {
                Some(id) => vec![self.dispatch(id, status, UpdateOrigin::Modal, now)],
                None => Vec::new(),
            },
            Msg::UpdateSucceeded { id, status, origin } => {
                tracing::info!(issue_id = %id, status = %status, "Issue status updated");
                match origin {
                    UpdateOrigin::Table => self.notify(Notice::info(QUICK_UPDATE_OK_NOTICE)),
                    UpdateOrigin::Modal => {
                        self.open_detail = None;
                        self.notify(Notice::info(format!("Issue marked as {}!", status.label())))
                    }
                }
            }
            Msg::UpdateFailed { id, error, origin } => {
                tracing::error!(issue_id = %id, error = %error, "Error updating issue");
                let text = match origin {
                    UpdateOrigin::Table => QUICK_UPDATE_FAILED_NOTICE,
                    UpdateOrigin::Modal => MODAL_UPDATE_FAILED_NOTICE,
                };
                self.notify(Notice::error(text))
            }
            Msg::SwitchView(view) => {
                self.view = view;
                Vec::new()
            }
            Msg::Logout => match sign_out(self.session.as_ref()) {
                Gate::Redirect { to, .. } => vec![Command::Redirect { notice: None, to }],
                Gate::Granted(_) => Vec::new(),
            },
        }
    }

    fn dispatch(&self, id: IssueId, status: Status, origin: UpdateOrigin, now: Timestamp) -> Command {
        let update = match self.cache.find(&id) {
            Some(issue) => StatusUpdate::for_issue(issue, status, now),
            // Unknown report time: the resolution still carries both stamps.
            None if status == Status::Resolved => StatusUpdate {
                status,
                resolved_at: Some(now),
                response_time_ms: Some(0),
            },
            None => StatusUpdate::plain(status),
        };
        Command::Dispatch { id, update, origin }
    }

    fn notify(&mut self, notice: Notice) -> Vec<Command> {
        self.last_notice = Some(notice.clone());
        vec![Command::Notify(notice)]
    }

    /// Execute `commands`, feeding each result back into the controller
    /// until nothing is left to do. Dispatches are awaited one at a time.
    pub async fn run_commands(
        &mut self,
        commands: Vec<Command>,
        store: &dyn IssueStore,
        shell: &mut dyn Shell,
    ) {
        let mut queue: VecDeque<Command> = commands.into();
        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                Command::Confirm { prompt } => {
                    let accepted = shell.confirm(&prompt).await;
                    self.update(Msg::Confirmed(accepted))
                }
                Command::Dispatch { id, update, origin } => {
                    let status = update.status;
                    match store.update_status(&id, update).await {
                        Ok(_) => self.update(Msg::UpdateSucceeded { id, status, origin }),
                        Err(e) => self.update(Msg::UpdateFailed {
                            id,
                            error: e.to_string(),
                            origin,
                        }),
                    }
                }
                Command::Notify(notice) => {
                    shell.notify(&notice);
                    Vec::new()
                }
                Command::Redirect { notice, to } => {
                    if let Some(notice) = notice {
                        shell.notify(&Notice::info(notice));
                    }
                    shell.redirect(to);
                    Vec::new()
                }
            };
            queue.extend(follow_up);
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn admin(&self) -> &AdminSession {
        &self.admin
    }

    pub fn is_loading(&self) -> bool {
        self.cache.is_loading()
    }

    pub fn issues(&self) -> &[Issue] {
        self.cache.issues()
    }

    pub fn filter(&self) -> &IssueFilter {
        &self.filter
    }

    pub fn current_view(&self) -> View {
        self.view
    }

    pub fn open_detail_id(&self) -> Option<&str> {
        self.open_detail.as_deref()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    /// The cached set narrowed by the active filter, in cache order.
    pub fn filtered(&self) -> Vec<&Issue> {
        self.filter.apply(self.cache.issues())
    }

    // -- rendering -----------------------------------------------------------

    /// Counters always cover the unfiltered set.
    pub fn overview<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> OverviewView {
        view::overview_view(self.cache.issues(), now)
    }

    pub fn table<Tz: TimeZone>(&self, tz: &Tz) -> TableView
    where
        Tz::Offset: std::fmt::Display,
    {
        view::table_view(&self.filtered(), tz)
    }

    pub fn detail<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<IssueDetail>
    where
        Tz::Offset: std::fmt::Display,
    {
        let id = self.open_detail.as_deref()?;
        self.cache.find(id).map(|issue| view::detail_view(issue, now))
    }

    pub fn map(&self) -> MapView {
        view::map_view(self.cache.issues())
    }

    pub fn analytics<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AnalyticsView {
        view::analytics_view(self.cache.issues(), DEFAULT_TIMELINE_DAYS, now)
    }
}

/// Wait for the next snapshot on `rx` and wrap it as a message.
pub async fn next_snapshot(rx: &mut watch::Receiver<Arc<Snapshot>>) -> Msg {
    match rx.changed().await {
        Ok(()) => Msg::SnapshotReceived(rx.borrow_and_update().clone()),
        Err(_) => Msg::SnapshotFailed("snapshot feed closed".into()),
    }
}
