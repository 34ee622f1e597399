use crate::reports::{CatchUpOutcome, SubscriberStats};
use crate::types::{
    AssignOutcome, DeliveryOutcome, DomainError, Editor, EntityKind, IssueKey, MissingEntity,
    Newspaper, Subscriber,
};

/// Registry owning every newspaper, editor and subscriber.
///
/// One instance is the single source of truth for entity existence; all
/// cross-entity operations resolve their participants here. The registry
/// performs no synchronization of its own — callers share it behind a lock
/// and keep at most one mutation in flight.
#[derive(Debug, Default)]
pub struct Agency {
    newspapers: Vec<Newspaper>,
    editors: Vec<Editor>,
    subscribers: Vec<Subscriber>,
}

impl Agency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a newspaper, keeping paper ids mutually distinct.
    pub fn add_newspaper(&mut self, paper: Newspaper) -> Result<(), DomainError> {
        if self
            .newspapers
            .iter()
            .any(|existing| existing.paper_id == paper.paper_id)
        {
            return Err(DomainError::DuplicateIdentifier {
                kind: EntityKind::Newspaper,
                id: paper.paper_id,
            });
        }
        self.newspapers.push(paper);
        Ok(())
    }

    pub fn get_newspaper(&self, paper_id: u32) -> Option<&Newspaper> {
        self.newspapers
            .iter()
            .find(|paper| paper.paper_id == paper_id)
    }

    pub fn get_newspaper_mut(&mut self, paper_id: u32) -> Option<&mut Newspaper> {
        self.newspapers
            .iter_mut()
            .find(|paper| paper.paper_id == paper_id)
    }

    /// Papers in admission order.
    pub fn all_newspapers(&self) -> &[Newspaper] {
        &self.newspapers
    }

    /// Removes by id. Absent ids are a tolerated no-op; the return value
    /// reports whether anything was removed.
    pub fn remove_newspaper(&mut self, paper_id: u32) -> bool {
        let before = self.newspapers.len();
        self.newspapers.retain(|paper| paper.paper_id != paper_id);
        self.newspapers.len() != before
    }

    pub fn add_editor(&mut self, editor: Editor) -> Result<(), DomainError> {
        if self.editors.iter().any(|existing| existing.id == editor.id) {
            return Err(DomainError::DuplicateIdentifier {
                kind: EntityKind::Editor,
                id: editor.id,
            });
        }
        self.editors.push(editor);
        Ok(())
    }

    pub fn get_editor(&self, editor_id: u32) -> Option<&Editor> {
        self.editors.iter().find(|editor| editor.id == editor_id)
    }

    pub fn get_editor_mut(&mut self, editor_id: u32) -> Option<&mut Editor> {
        self.editors
            .iter_mut()
            .find(|editor| editor.id == editor_id)
    }

    pub fn get_editors(&self) -> &[Editor] {
        &self.editors
    }

    pub fn delete_editor(&mut self, editor_id: u32) -> bool {
        let before = self.editors.len();
        self.editors.retain(|editor| editor.id != editor_id);
        self.editors.len() != before
    }

    pub fn add_subscriber(&mut self, subscriber: Subscriber) -> Result<(), DomainError> {
        if self
            .subscribers
            .iter()
            .any(|existing| existing.id == subscriber.id)
        {
            return Err(DomainError::DuplicateIdentifier {
                kind: EntityKind::Subscriber,
                id: subscriber.id,
            });
        }
        self.subscribers.push(subscriber);
        Ok(())
    }

    pub fn get_subscriber(&self, subscriber_id: u32) -> Option<&Subscriber> {
        self.subscribers
            .iter()
            .find(|subscriber| subscriber.id == subscriber_id)
    }

    pub fn get_subscriber_mut(&mut self, subscriber_id: u32) -> Option<&mut Subscriber> {
        self.subscribers
            .iter_mut()
            .find(|subscriber| subscriber.id == subscriber_id)
    }

    pub fn get_subscribers(&self) -> &[Subscriber] {
        &self.subscribers
    }

    pub fn remove_subscriber(&mut self, subscriber_id: u32) -> bool {
        let before = self.subscribers.len();
        self.subscribers
            .retain(|subscriber| subscriber.id != subscriber_id);
        self.subscribers.len() != before
    }

    /// Assigns an editor to an issue, updating the issue's editor id and the
    /// editor's worklist together.
    pub fn assign_editor(
        &mut self,
        key: IssueKey,
        editor_id: u32,
    ) -> Result<AssignOutcome, MissingEntity> {
        let paper = self
            .newspapers
            .iter_mut()
            .find(|paper| paper.paper_id == key.paper_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Newspaper,
                id: key.paper_id,
            })?;
        let issue = paper.get_issue_mut(key.issue_id).ok_or(MissingEntity {
            kind: EntityKind::Issue,
            id: key.issue_id,
        })?;
        let editor = self
            .editors
            .iter_mut()
            .find(|editor| editor.id == editor_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Editor,
                id: editor_id,
            })?;
        Ok(issue.set_editor(editor))
    }

    /// Delivers one issue to one subscriber through the bidirectional path.
    pub fn deliver_issue(
        &mut self,
        key: IssueKey,
        subscriber_id: u32,
    ) -> Result<DeliveryOutcome, MissingEntity> {
        let paper = self
            .newspapers
            .iter_mut()
            .find(|paper| paper.paper_id == key.paper_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Newspaper,
                id: key.paper_id,
            })?;
        let issue = paper.get_issue_mut(key.issue_id).ok_or(MissingEntity {
            kind: EntityKind::Issue,
            id: key.issue_id,
        })?;
        let subscriber = self
            .subscribers
            .iter_mut()
            .find(|subscriber| subscriber.id == subscriber_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Subscriber,
                id: subscriber_id,
            })?;
        Ok(issue.send_issue(subscriber))
    }

    /// Subscribes a subscriber to a newspaper. No uniqueness check; repeat
    /// subscriptions stack.
    pub fn subscribe(&mut self, subscriber_id: u32, paper_id: u32) -> Result<(), MissingEntity> {
        let position = self
            .subscribers
            .iter()
            .position(|subscriber| subscriber.id == subscriber_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Subscriber,
                id: subscriber_id,
            })?;
        let paper = self
            .newspapers
            .iter()
            .find(|paper| paper.paper_id == paper_id)
            .ok_or(MissingEntity {
                kind: EntityKind::Newspaper,
                id: paper_id,
            })?;
        self.subscribers[position].subscribe(paper);
        Ok(())
    }

    /// Derived statistics for one subscriber; `None` when the subscriber is
    /// unknown.
    pub fn subscriber_stats(&self, subscriber_id: u32) -> Option<SubscriberStats> {
        self.get_subscriber(subscriber_id)
            .map(|subscriber| subscriber.create_stats(&self.newspapers))
    }

    /// Delivers every not-yet-received issue of the subscriber's papers and
    /// reports their names.
    ///
    /// Query and mutation in one: a second run reports no missing issues.
    /// `None` when the subscriber is unknown. Subscriptions to papers that
    /// have since been removed are skipped.
    pub fn deliver_missing_issues(&mut self, subscriber_id: u32) -> Option<CatchUpOutcome> {
        let subscribed = self
            .subscribers
            .iter()
            .find(|subscriber| subscriber.id == subscriber_id)?
            .subscribed_newspapers
            .clone();

        let mut delivered = Vec::new();
        for paper_id in subscribed {
            let Some(paper) = self
                .newspapers
                .iter_mut()
                .find(|paper| paper.paper_id == paper_id)
            else {
                continue;
            };
            let Some(subscriber) = self
                .subscribers
                .iter_mut()
                .find(|subscriber| subscriber.id == subscriber_id)
            else {
                break;
            };
            for issue in paper.issues.iter_mut() {
                let already_received = issue
                    .key()
                    .map(|key| subscriber.has_received(key))
                    .unwrap_or(false);
                if already_received {
                    continue;
                }
                if issue.send_issue(subscriber) == DeliveryOutcome::Delivered {
                    delivered.push(issue.name.clone());
                }
            }
        }

        if delivered.is_empty() {
            Some(CatchUpOutcome::NoMissingIssues)
        } else {
            Some(CatchUpOutcome::Delivered { issues: delivered })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Issue;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn key(paper_id: u32, issue_id: u32) -> IssueKey {
        IssueKey { paper_id, issue_id }
    }

    /// Fixture mirroring the sample agency: four papers with two issues
    /// each, four editors, four subscribers.
    fn populated() -> Agency {
        let mut agency = Agency::new();
        for paper in [
            Newspaper::new(100, "The New York Times", 7, 13.14),
            Newspaper::new(101, "Heute", 1, 1.12),
            Newspaper::new(115, "Wall Street Journal", 1, 3.00),
            Newspaper::new(125, "National Geographic", 30, 34.00),
        ] {
            agency.add_newspaper(paper).unwrap();
        }
        for editor in [
            Editor::new(100, "William Shakespeare"),
            Editor::new(101, "Agatha Christie"),
            Editor::new(102, "J. K. Rowling"),
            Editor::new(103, "Stephen King"),
        ] {
            agency.add_editor(editor).unwrap();
        }
        for subscriber in [
            Subscriber::new(100, "Sophia Nguyen"),
            Subscriber::new(101, "Elijah Patel"),
            Subscriber::new(102, "Olivia Mitchell"),
            Subscriber::new(103, "Gabriel Taylor"),
        ] {
            agency.add_subscriber(subscriber).unwrap();
        }
        for paper_id in [100, 101, 115, 125] {
            let paper = agency.get_newspaper_mut(paper_id).unwrap();
            paper
                .add_issue(Issue::new(100, "Vol. 1", date(2022, 4, 4), true))
                .unwrap();
            paper
                .add_issue(Issue::new(102, "Vol. 2", date(2025, 5, 5), false))
                .unwrap();
        }
        agency
    }

    #[test]
    fn add_then_get_returns_what_was_added() {
        let mut agency = Agency::new();
        agency
            .add_newspaper(Newspaper::new(999, "Simpsons Comic", 7, 3.14))
            .unwrap();

        let paper = agency.get_newspaper(999).expect("paper should be present");
        assert_eq!(paper.paper_id, 999);
        assert_eq!(paper.name, "Simpsons Comic");
        assert_eq!(paper.frequency, 7);
        assert_eq!(paper.price, 3.14);
        assert!(agency.get_newspaper(0).is_none());
    }

    #[test]
    fn duplicate_newspaper_id_is_rejected() {
        let mut agency = Agency::new();
        agency
            .add_newspaper(Newspaper::new(999, "Simpsons Comic", 7, 3.14))
            .unwrap();

        let err = agency
            .add_newspaper(Newspaper::new(999, "Superman Comic", 7, 13.14))
            .expect_err("second id 999 should be rejected");

        assert_eq!(
            err,
            DomainError::DuplicateIdentifier {
                kind: EntityKind::Newspaper,
                id: 999
            }
        );
        assert_eq!(agency.all_newspapers().len(), 1);
    }

    #[test]
    fn duplicate_editor_and_subscriber_ids_are_rejected() {
        let mut agency = populated();
        let editors_before = agency.get_editors().len();
        let subscribers_before = agency.get_subscribers().len();

        assert!(agency.add_editor(Editor::new(100, "Tom Clancy")).is_err());
        assert!(agency
            .add_subscriber(Subscriber::new(100, "Tom Clancy"))
            .is_err());

        assert_eq!(agency.get_editors().len(), editors_before);
        assert_eq!(agency.get_subscribers().len(), subscribers_before);
    }

    #[test]
    fn removal_is_tolerant() {
        let mut agency = populated();
        let before = agency.all_newspapers().len();

        assert!(agency.remove_newspaper(100));
        assert_eq!(agency.all_newspapers().len(), before - 1);

        // Removing again is a no-op, not an error.
        assert!(!agency.remove_newspaper(100));
        assert_eq!(agency.all_newspapers().len(), before - 1);

        assert!(agency.delete_editor(103));
        assert!(!agency.delete_editor(103));
        assert!(agency.remove_subscriber(103));
        assert!(!agency.remove_subscriber(103));
    }

    #[test]
    fn assign_editor_links_issue_and_worklist() {
        let mut agency = populated();

        let outcome = agency.assign_editor(key(100, 100), 100).unwrap();
        assert_eq!(outcome, AssignOutcome::Assigned);

        let editor = agency.get_editor(100).unwrap();
        assert_eq!(editor.issues(), [key(100, 100)]);
        let issue = agency.get_newspaper(100).unwrap().get_issue(100).unwrap();
        assert_eq!(issue.editor_id(), Some(100));

        // Repeating the assignment must not duplicate the worklist entry.
        let outcome = agency.assign_editor(key(100, 100), 100).unwrap();
        assert_eq!(outcome, AssignOutcome::AlreadyAssigned);
        assert_eq!(agency.get_editor(100).unwrap().issues().len(), 1);
    }

    #[test]
    fn assign_editor_reports_the_missing_participant() {
        let mut agency = populated();

        let err = agency.assign_editor(key(100, 100), 999).unwrap_err();
        assert_eq!(err.kind, EntityKind::Editor);
        assert_eq!(err.id, 999);

        let err = agency.assign_editor(key(100, 999), 100).unwrap_err();
        assert_eq!(err.kind, EntityKind::Issue);

        let err = agency.assign_editor(key(999, 100), 100).unwrap_err();
        assert_eq!(err.kind, EntityKind::Newspaper);
    }

    #[test]
    fn deliver_issue_is_idempotent_through_the_registry() {
        let mut agency = populated();

        assert_eq!(
            agency.deliver_issue(key(100, 100), 100).unwrap(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            agency.deliver_issue(key(100, 100), 100).unwrap(),
            DeliveryOutcome::AlreadySent
        );

        let issue = agency.get_newspaper(100).unwrap().get_issue(100).unwrap();
        assert_eq!(issue.send_to(), [100]);
        let subscriber = agency.get_subscriber(100).unwrap();
        assert_eq!(subscriber.received_issues(), [key(100, 100)]);
    }

    #[test]
    fn subscribe_requires_both_parties() {
        let mut agency = populated();

        agency.subscribe(100, 100).unwrap();
        assert_eq!(
            agency.get_subscriber(100).unwrap().subscribed_newspapers(),
            [100]
        );

        let err = agency.subscribe(100, 42).unwrap_err();
        assert_eq!(err.kind, EntityKind::Newspaper);
        let err = agency.subscribe(42, 100).unwrap_err();
        assert_eq!(err.kind, EntityKind::Subscriber);
    }

    #[test]
    fn stats_sum_costs_and_group_received_issues() {
        let mut agency = populated();
        agency.subscribe(100, 100).unwrap();
        agency.subscribe(100, 101).unwrap();
        agency.deliver_issue(key(100, 100), 100).unwrap();
        agency.deliver_issue(key(100, 102), 100).unwrap();
        agency.deliver_issue(key(101, 100), 100).unwrap();

        let stats = agency.subscriber_stats(100).unwrap();
        assert_eq!(stats.subscriptions, 2);
        assert!((stats.monthly_cost - 14.26).abs() < 1e-9);
        assert!((stats.annual_cost - 171.12).abs() < 1e-9);
        assert_eq!(stats.issues_per_paper.len(), 2);
        assert_eq!(stats.issues_per_paper[0].received, 2);
        assert_eq!(stats.issues_per_paper[1].received, 1);

        assert!(agency.subscriber_stats(42).is_none());
    }

    #[test]
    fn catch_up_delivers_exactly_the_missing_issues() {
        let mut agency = populated();
        agency.subscribe(100, 100).unwrap();
        agency.deliver_issue(key(100, 100), 100).unwrap();

        let outcome = agency.deliver_missing_issues(100).unwrap();
        assert_eq!(
            outcome,
            CatchUpOutcome::Delivered {
                issues: vec!["Vol. 2".to_string()]
            }
        );

        // Caught up now: the second run has nothing left to send.
        let outcome = agency.deliver_missing_issues(100).unwrap();
        assert_eq!(outcome, CatchUpOutcome::NoMissingIssues);

        let subscriber = agency.get_subscriber(100).unwrap();
        assert_eq!(
            subscriber.received_issues(),
            [key(100, 100), key(100, 102)]
        );
        let issue = agency.get_newspaper(100).unwrap().get_issue(102).unwrap();
        assert_eq!(issue.send_to(), [100]);
    }

    #[test]
    fn catch_up_for_unknown_subscriber_is_absent() {
        let mut agency = populated();
        assert!(agency.deliver_missing_issues(42).is_none());
    }
}
