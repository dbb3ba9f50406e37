// 🏷️ Change Classifier - one notification per roster change
// Updated pairs report a single dominant reason, checked in fixed priority:
// team → end date → roster status → role. Any other field is not announced.

use crate::reconciliation::ChangeSet;
use crate::record::Record;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// REASONS & COLORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeReason {
    TeamChange,
    EndDateChange,
    RosterStatusChange,
    RoleChange,
    Added,
    Removed,
}

impl ChangeReason {
    /// Update reasons, highest priority first
    pub const UPDATE_PRIORITY: [ChangeReason; 4] = [
        ChangeReason::TeamChange,
        ChangeReason::EndDateChange,
        ChangeReason::RosterStatusChange,
        ChangeReason::RoleChange,
    ];

    /// Whether the watched field behind this reason differs between the two records
    pub fn differs(&self, old: &Record, new: &Record) -> bool {
        match self {
            ChangeReason::TeamChange => old.team_name() != new.team_name(),
            ChangeReason::EndDateChange => old.end_date() != new.end_date(),
            ChangeReason::RosterStatusChange => old.roster_status() != new.roster_status(),
            ChangeReason::RoleChange => old.role() != new.role(),
            ChangeReason::Added | ChangeReason::Removed => false,
        }
    }

    pub fn color(&self) -> NotificationColor {
        match self {
            ChangeReason::Added => NotificationColor::Added,
            ChangeReason::Removed => NotificationColor::Removed,
            _ => NotificationColor::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationColor {
    Update,
    Added,
    Removed,
}

impl NotificationColor {
    /// Embed color as a 24-bit RGB integer
    pub fn value(&self) -> u32 {
        match self {
            NotificationColor::Update => 0x118822,
            NotificationColor::Removed => 0xDD3322,
            NotificationColor::Added => 0x2266EE,
        }
    }
}

// ============================================================================
// NOTIFICATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub reason: ChangeReason,
    pub color: NotificationColor,
    pub title: String,

    /// Handle whose profile image should illustrate the message
    pub image_handle: Option<String>,
}

impl Notification {
    fn about(reason: ChangeReason, subject: &Record, title: String) -> Self {
        Notification {
            reason,
            color: reason.color(),
            title,
            image_handle: Some(subject.handle_name().to_string()),
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeClassifier;

impl ChangeClassifier {
    pub fn new() -> Self {
        ChangeClassifier
    }

    /// Dominant reason for an updated pair, `None` when only unwatched fields differ
    pub fn dominant_reason(&self, old: &Record, new: &Record) -> Option<ChangeReason> {
        ChangeReason::UPDATE_PRIORITY
            .into_iter()
            .find(|reason| reason.differs(old, new))
    }

    pub fn classify_update(&self, old: &Record, new: &Record) -> Option<Notification> {
        let reason = self.dominant_reason(old, new)?;

        let title = match reason {
            ChangeReason::TeamChange => format!(
                "{}({} {}, {}, ex-{}) joined {}",
                new.handle_name(),
                new.first_name(),
                new.family_name(),
                new.role(),
                old.team_name(),
                new.team_name(),
            ),
            ChangeReason::EndDateChange => format!(
                "The end date of {}({} {}, {} in {}) was changed from {} to {}",
                new.handle_name(),
                new.first_name(),
                new.family_name(),
                new.role(),
                new.team_name(),
                old.end_date(),
                new.end_date(),
            ),
            ChangeReason::RosterStatusChange => format!(
                "{}({} {}, {} in {}) is {} now",
                new.handle_name(),
                new.first_name(),
                new.family_name(),
                new.role(),
                new.team_name(),
                new.roster_status(),
            ),
            ChangeReason::RoleChange => format!(
                "{}({} {} in {}) changed role from {} to {}",
                new.handle_name(),
                new.first_name(),
                new.family_name(),
                new.team_name(),
                old.role(),
                new.role(),
            ),
            ChangeReason::Added | ChangeReason::Removed => return None,
        };

        Some(Notification::about(reason, new, title))
    }

    pub fn classify_added(&self, record: &Record) -> Notification {
        let title = format!(
            "{}({} {}, {}) joined {}",
            record.handle_name(),
            record.first_name(),
            record.family_name(),
            record.role(),
            record.team_name(),
        );
        Notification::about(ChangeReason::Added, record, title)
    }

    pub fn classify_removed(&self, record: &Record) -> Notification {
        let title = format!(
            "{}({} {}, {}) was removed from {}",
            record.handle_name(),
            record.first_name(),
            record.family_name(),
            record.role(),
            record.team_name(),
        );
        Notification::about(ChangeReason::Removed, record, title)
    }

    /// All notifications for a run: updates (pairing order), then removals, then additions
    pub fn classify(&self, changes: &ChangeSet) -> Vec<Notification> {
        let mut notifications = Vec::new();

        for (old, new) in changes.updated_pairs() {
            match self.classify_update(old, new) {
                Some(notification) => notifications.push(notification),
                None => debug!(key = %new.key(), "update touches no watched field"),
            }
        }

        notifications.extend(changes.removed.iter().map(|r| self.classify_removed(r)));
        notifications.extend(changes.added.iter().map(|r| self.classify_added(r)));

        notifications
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{League, RecordFields};

    fn create_test_record(team: &str, end_date: i32, role: &str, status: &str) -> Record {
        Record::new(
            League::Emea,
            RecordFields {
                team_name: team.to_string(),
                handle_name: "Boaster".to_string(),
                role: role.to_string(),
                first_name: "Jake".to_string(),
                family_name: "Howlett".to_string(),
                end_date: end_date.to_string(),
                resident: "Yes".to_string(),
                roster_status: status.to_string(),
                team_tag: "FNC".to_string(),
                team_contact_info: "contact".to_string(),
            },
        )
    }

    #[test]
    fn test_team_change_title() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let new = create_test_record("Bar", 2024, "IGL", "Active");

        let n = classifier.classify_update(&old, &new).unwrap();

        assert_eq!(n.reason, ChangeReason::TeamChange);
        assert_eq!(n.title, "Boaster(Jake Howlett, IGL, ex-Foo) joined Bar");
        assert_eq!(n.color, NotificationColor::Update);
        assert_eq!(n.image_handle.as_deref(), Some("Boaster"));
    }

    #[test]
    fn test_team_beats_end_date() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let new = create_test_record("Bar", 2026, "Duelist", "Inactive");

        let n = classifier.classify_update(&old, &new).unwrap();

        assert_eq!(n.reason, ChangeReason::TeamChange);
    }

    #[test]
    fn test_end_date_beats_status_and_role() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let new = create_test_record("Foo", 2026, "Duelist", "Inactive");

        let n = classifier.classify_update(&old, &new).unwrap();

        assert_eq!(n.reason, ChangeReason::EndDateChange);
        assert_eq!(
            n.title,
            "The end date of Boaster(Jake Howlett, Duelist in Foo) was changed from 2024 to 2026"
        );
    }

    #[test]
    fn test_status_beats_role() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let new = create_test_record("Foo", 2024, "Duelist", "Inactive");

        let n = classifier.classify_update(&old, &new).unwrap();

        assert_eq!(n.reason, ChangeReason::RosterStatusChange);
        assert_eq!(n.title, "Boaster(Jake Howlett, Duelist in Foo) is Inactive now");
    }

    #[test]
    fn test_role_change_title() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let new = create_test_record("Foo", 2024, "Coach", "Active");

        let n = classifier.classify_update(&old, &new).unwrap();

        assert_eq!(n.reason, ChangeReason::RoleChange);
        assert_eq!(n.title, "Boaster(Jake Howlett in Foo) changed role from IGL to Coach");
    }

    #[test]
    fn test_unwatched_field_is_silent() {
        let classifier = ChangeClassifier::new();
        let old = create_test_record("Foo", 2024, "IGL", "Active");
        let mut values = old.values();
        values[10] = "someone-else".to_string();
        values[9] = "FOO".to_string();
        let new = Record::from_fields(&values).unwrap();

        assert_ne!(old, new);
        assert_eq!(classifier.dominant_reason(&old, &new), None);
        assert!(classifier.classify_update(&old, &new).is_none());
    }

    #[test]
    fn test_added_and_removed_titles() {
        let classifier = ChangeClassifier::new();
        let record = create_test_record("Foo", 2024, "IGL", "Active");

        let added = classifier.classify_added(&record);
        let removed = classifier.classify_removed(&record);

        assert_eq!(added.title, "Boaster(Jake Howlett, IGL) joined Foo");
        assert_eq!(added.color.value(), 0x2266EE);
        assert_eq!(removed.title, "Boaster(Jake Howlett, IGL) was removed from Foo");
        assert_eq!(removed.color.value(), 0xDD3322);
    }

    #[test]
    fn test_emission_order_updates_removed_added() {
        let classifier = ChangeClassifier::new();
        let changes = ChangeSet {
            updated_old: vec![create_test_record("Foo", 2024, "IGL", "Active")],
            updated_new: vec![create_test_record("Bar", 2024, "IGL", "Active")],
            added: vec![create_test_record("Baz", 2025, "IGL", "Active")],
            removed: vec![create_test_record("Qux", 2023, "IGL", "Active")],
        };

        let reasons: Vec<ChangeReason> =
            classifier.classify(&changes).into_iter().map(|n| n.reason).collect();

        assert_eq!(
            reasons,
            vec![ChangeReason::TeamChange, ChangeReason::Removed, ChangeReason::Added]
        );
    }

    #[test]
    fn test_silent_pair_does_not_hide_later_pairs() {
        let classifier = ChangeClassifier::new();
        let quiet_old = create_test_record("Foo", 2024, "IGL", "Active");
        let mut values = quiet_old.values();
        values[10] = "changed".to_string();
        let quiet_new = Record::from_fields(&values).unwrap();

        let changes = ChangeSet {
            updated_old: vec![quiet_old, create_test_record("Foo", 2024, "IGL", "Active")],
            updated_new: vec![quiet_new, create_test_record("Foo", 2025, "IGL", "Active")],
            ..ChangeSet::default()
        };

        let notifications = classifier.classify(&changes);

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].reason, ChangeReason::EndDateChange);
    }
}
