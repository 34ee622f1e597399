use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies an issue across the registry.
///
/// Issue ids are only unique within their owning newspaper, so every
/// relation that points at an issue carries the paper id as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueKey {
    pub paper_id: u32,
    pub issue_id: u32,
}

/// Kinds of registry-owned entities, used to label errors and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Newspaper,
    Issue,
    Editor,
    Subscriber,
}

impl EntityKind {
    /// Returns the canonical lowercase name used in responses and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newspaper => "newspaper",
            Self::Issue => "issue",
            Self::Editor => "editor",
            Self::Subscriber => "subscriber",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections raised by the domain layer.
///
/// Absence is never an error; lookups return `Option` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{kind} with id {id} already exists")]
    DuplicateIdentifier { kind: EntityKind, id: u32 },
}

/// Lookup miss reported by cross-entity registry operations, naming the
/// participant that was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} with id {id} was not found")]
pub struct MissingEntity {
    pub kind: EntityKind,
    pub id: u32,
}

/// A publication owning an ordered collection of issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Newspaper {
    pub paper_id: u32,
    pub name: String,
    /// Days between issues.
    pub frequency: u32,
    /// Monthly price.
    pub price: f64,
    #[serde(default)]
    pub(crate) issues: Vec<Issue>,
}

impl Newspaper {
    pub fn new(paper_id: u32, name: impl Into<String>, frequency: u32, price: f64) -> Self {
        Self {
            paper_id,
            name: name.into(),
            frequency,
            price,
            issues: Vec::new(),
        }
    }

    /// Attaches a detached issue, recording the back-reference to this paper.
    ///
    /// Rejected when another issue of this paper already carries the id.
    pub fn add_issue(&mut self, mut issue: Issue) -> Result<(), DomainError> {
        if self.issues.iter().any(|existing| existing.id == issue.id) {
            return Err(DomainError::DuplicateIdentifier {
                kind: EntityKind::Issue,
                id: issue.id,
            });
        }
        issue.paper_id = Some(self.paper_id);
        self.issues.push(issue);
        Ok(())
    }

    pub fn get_issue(&self, id: u32) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    pub fn get_issue_mut(&mut self, id: u32) -> Option<&mut Issue> {
        self.issues.iter_mut().find(|issue| issue.id == id)
    }

    /// Issues in creation order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Releases the issue with the provided id, stamping the release moment.
    ///
    /// Returns `None` when no issue of this paper carries the id, which is
    /// distinct from the already-released signal.
    pub fn release_issue(&mut self, id: u32, now: DateTime<Utc>) -> Option<ReleaseOutcome> {
        self.get_issue_mut(id).map(|issue| issue.release(now))
    }
}

/// One dated edition of a newspaper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u32,
    pub name: String,
    pub releasedate: DateTime<Utc>,
    #[serde(default)]
    pub(crate) released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) editor_id: Option<u32>,
    #[serde(default)]
    pub(crate) send_to: Vec<u32>,
    /// Owning newspaper, recorded once when the issue is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) paper_id: Option<u32>,
}

impl Issue {
    /// Creates a detached issue. Attachment happens through
    /// [`Newspaper::add_issue`], which is the only way issues enter a paper.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        releasedate: DateTime<Utc>,
        released: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            releasedate,
            released,
            editor_id: None,
            send_to: Vec::new(),
            paper_id: None,
        }
    }

    /// Key of this issue once attached; `None` while detached.
    pub fn key(&self) -> Option<IssueKey> {
        self.paper_id.map(|paper_id| IssueKey {
            paper_id,
            issue_id: self.id,
        })
    }

    /// Id of the owning newspaper once attached.
    pub fn newspaper(&self) -> Option<u32> {
        self.paper_id
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn editor_id(&self) -> Option<u32> {
        self.editor_id
    }

    /// Subscriber ids this issue has been sent to, in delivery order.
    pub fn send_to(&self) -> &[u32] {
        &self.send_to
    }

    /// Pending → Released, one-directional. Releasing again leaves the
    /// stamp untouched and reports the repeat.
    pub(crate) fn release(&mut self, now: DateTime<Utc>) -> ReleaseOutcome {
        if self.released {
            return ReleaseOutcome::AlreadyReleased;
        }
        self.released = true;
        self.releasedate = now;
        ReleaseOutcome::Released
    }

    /// Records the editor on this issue and the issue on the editor's
    /// worklist. Worklist membership is idempotent; the editor id itself is
    /// overwritten on re-assignment.
    ///
    /// A detached issue only records the editor id, since there is no key to
    /// index the worklist with yet.
    pub fn set_editor(&mut self, editor: &mut Editor) -> AssignOutcome {
        self.editor_id = Some(editor.id);
        match self.key() {
            Some(key) => editor.assign(key),
            None => AssignOutcome::Assigned,
        }
    }

    /// Delivers this issue to the subscriber.
    ///
    /// Both sides of the relation are updated together: the subscriber id
    /// lands in `send_to` and the issue key in the subscriber's received
    /// set. Repeat deliveries mutate nothing and report the repeat.
    pub fn send_issue(&mut self, subscriber: &mut Subscriber) -> DeliveryOutcome {
        if self.send_to.contains(&subscriber.id) {
            return DeliveryOutcome::AlreadySent;
        }
        self.send_to.push(subscriber.id);
        if let Some(key) = self.key() {
            subscriber.receive(key);
        }
        DeliveryOutcome::Delivered
    }
}

/// A person assignable to issues across newspapers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub(crate) work_on_issues: Vec<IssueKey>,
}

impl Editor {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            work_on_issues: Vec::new(),
        }
    }

    /// Keys of the issues this editor has been assigned to.
    pub fn issues(&self) -> &[IssueKey] {
        &self.work_on_issues
    }

    pub(crate) fn assign(&mut self, key: IssueKey) -> AssignOutcome {
        if self.work_on_issues.contains(&key) {
            return AssignOutcome::AlreadyAssigned;
        }
        self.work_on_issues.push(key);
        AssignOutcome::Assigned
    }
}

/// A person subscribed to zero or more newspapers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub(crate) subscribed_newspapers: Vec<u32>,
    #[serde(default)]
    pub(crate) received_issues: Vec<IssueKey>,
}

impl Subscriber {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subscribed_newspapers: Vec::new(),
            received_issues: Vec::new(),
        }
    }

    /// Records a subscription. Subscribing twice to the same paper is
    /// permitted and kept as-is; both entries count towards the costs.
    pub fn subscribe(&mut self, newspaper: &Newspaper) {
        self.subscribed_newspapers.push(newspaper.paper_id);
    }

    /// Paper ids in subscription order, duplicates included.
    pub fn subscribed_newspapers(&self) -> &[u32] {
        &self.subscribed_newspapers
    }

    /// Keys of the issues actually delivered to this subscriber.
    pub fn received_issues(&self) -> &[IssueKey] {
        &self.received_issues
    }

    pub fn has_received(&self, key: IssueKey) -> bool {
        self.received_issues.contains(&key)
    }

    /// Derives the subscription statistics against the provided papers.
    pub fn create_stats(&self, newspapers: &[Newspaper]) -> crate::reports::SubscriberStats {
        crate::reports::SubscriberStats::collect(self, newspapers)
    }

    pub(crate) fn receive(&mut self, key: IssueKey) {
        if !self.received_issues.contains(&key) {
            self.received_issues.push(key);
        }
    }
}

/// Result of a release attempt on an existing issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOutcome {
    Released,
    AlreadyReleased,
}

impl ReleaseOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::AlreadyReleased => "already_released",
        }
    }
}

/// Result of delivering an issue to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    AlreadySent,
}

impl DeliveryOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::AlreadySent => "already_sent",
        }
    }
}

/// Result of assigning an editor to an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOutcome {
    Assigned,
    AlreadyAssigned,
}

impl AssignOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::AlreadyAssigned => "already_assigned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn attached_issue(paper: &mut Newspaper, id: u32, name: &str) -> IssueKey {
        paper
            .add_issue(Issue::new(id, name, date(2025, 5, 5), false))
            .expect("issue id should be free");
        IssueKey {
            paper_id: paper.paper_id,
            issue_id: id,
        }
    }

    #[test]
    fn add_issue_rejects_duplicate_id() {
        let mut paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        attached_issue(&mut paper, 100, "Vol. 1");

        let err = paper
            .add_issue(Issue::new(100, "Vol. 1 again", date(2025, 5, 5), false))
            .expect_err("second id 100 should be rejected");

        assert_eq!(
            err,
            DomainError::DuplicateIdentifier {
                kind: EntityKind::Issue,
                id: 100
            }
        );
        assert_eq!(paper.issues().len(), 1);
    }

    #[test]
    fn add_issue_records_back_reference() {
        let mut paper = Newspaper::new(115, "Wall Street Journal", 1, 3.00);
        attached_issue(&mut paper, 1, "Morning edition");

        let issue = paper.get_issue(1).expect("issue should be attached");
        assert_eq!(issue.newspaper(), Some(115));
        assert_eq!(
            issue.key(),
            Some(IssueKey {
                paper_id: 115,
                issue_id: 1
            })
        );
    }

    #[test]
    fn release_stamps_once_and_reports_repeat() {
        let mut paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        attached_issue(&mut paper, 100, "Vol. 1");

        let first_release = date(2026, 1, 1);
        assert_eq!(
            paper.release_issue(100, first_release),
            Some(ReleaseOutcome::Released)
        );
        let issue = paper.get_issue(100).unwrap();
        assert!(issue.is_released());
        assert_eq!(issue.releasedate, first_release);

        // Second release must not move the stamp.
        assert_eq!(
            paper.release_issue(100, date(2026, 2, 2)),
            Some(ReleaseOutcome::AlreadyReleased)
        );
        let issue = paper.get_issue(100).unwrap();
        assert!(issue.is_released());
        assert_eq!(issue.releasedate, first_release);
    }

    #[test]
    fn release_unknown_id_is_distinguishable() {
        let mut paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        assert_eq!(paper.release_issue(42, date(2026, 1, 1)), None);
    }

    #[test]
    fn set_editor_links_both_sides_once() {
        let mut paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        let key = attached_issue(&mut paper, 100, "Vol. 1");
        let mut editor = Editor::new(100, "William Shakespeare");

        let issue = paper.get_issue_mut(100).unwrap();
        assert_eq!(issue.set_editor(&mut editor), AssignOutcome::Assigned);
        assert_eq!(issue.editor_id(), Some(100));
        assert_eq!(editor.issues(), [key]);

        // Re-assigning the same editor keeps the worklist deduplicated.
        assert_eq!(
            issue.set_editor(&mut editor),
            AssignOutcome::AlreadyAssigned
        );
        assert_eq!(editor.issues(), [key]);
    }

    #[test]
    fn reassignment_overwrites_editor_id() {
        let mut paper = Newspaper::new(101, "Heute", 1, 1.12);
        let key = attached_issue(&mut paper, 7, "Vol. 7");
        let mut first = Editor::new(100, "William Shakespeare");
        let mut second = Editor::new(101, "Agatha Christie");

        let issue = paper.get_issue_mut(7).unwrap();
        issue.set_editor(&mut first);
        issue.set_editor(&mut second);

        assert_eq!(issue.editor_id(), Some(101));
        assert_eq!(first.issues(), [key]);
        assert_eq!(second.issues(), [key]);
    }

    #[test]
    fn send_issue_is_idempotent_per_subscriber() {
        let mut paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        let key = attached_issue(&mut paper, 100, "Vol. 1");
        let mut subscriber = Subscriber::new(100, "Sophia Nguyen");

        let issue = paper.get_issue_mut(100).unwrap();
        assert_eq!(
            issue.send_issue(&mut subscriber),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            issue.send_issue(&mut subscriber),
            DeliveryOutcome::AlreadySent
        );

        assert_eq!(issue.send_to(), [100]);
        assert_eq!(subscriber.received_issues(), [key]);
    }

    #[test]
    fn subscribe_keeps_duplicates() {
        let paper = Newspaper::new(100, "The New York Times", 7, 13.14);
        let mut subscriber = Subscriber::new(100, "Sophia Nguyen");

        subscriber.subscribe(&paper);
        subscriber.subscribe(&paper);

        assert_eq!(subscriber.subscribed_newspapers(), [100, 100]);
    }
}
