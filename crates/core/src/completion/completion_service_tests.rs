#[cfg(test)]
mod tests {
    use crate::badges::{BadgeType, NewBadge};
    use crate::completion::*;
    use crate::events::{DomainEvent, MockDomainEventSink};
    use crate::quests::{QuestRepositoryTrait, QuestStatus};
    use crate::test_support::{quest_with_roster, InMemoryBadgeRepository, InMemoryQuestRepository};
    use chrono::Utc;
    use std::sync::Arc;

    struct Fixture {
        service: CompletionService,
        quests: Arc<InMemoryQuestRepository>,
        badges: Arc<InMemoryBadgeRepository>,
        events: MockDomainEventSink,
    }

    fn fixture(participants: &[&str]) -> Fixture {
        let quests = Arc::new(InMemoryQuestRepository::new());
        let badges = Arc::new(InMemoryBadgeRepository::new());
        quests.seed(quest_with_roster("q1", "org", participants));
        let events = MockDomainEventSink::new();
        let service = CompletionService::new(quests.clone(), badges.clone())
            .with_event_sink(Arc::new(events.clone()));
        Fixture {
            service,
            quests,
            badges,
            events,
        }
    }

    impl Fixture {
        fn give(&self, giver: &str, receiver: &str) {
            let id = format!("{}-{}-{}", giver, receiver, self.badges.len());
            self.badges.seed(
                NewBadge {
                    quest_id: "q1".to_string(),
                    giver_uid: giver.to_string(),
                    giver_name: giver.to_string(),
                    receiver_uid: receiver.to_string(),
                    receiver_name: receiver.to_string(),
                    badge_type: BadgeType::Heart,
                }
                .into_badge(id, Utc::now()),
            );
        }
    }

    #[tokio::test]
    async fn test_completes_when_every_participant_has_given() {
        let f = fixture(&["a", "b", "c"]);
        f.give("a", "b");
        f.give("b", "c");

        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert_eq!(status.badges_given, 2);
        assert_eq!(status.participants, 3);
        assert!(!status.completed);
        assert_eq!(
            f.quests.find_by_id("q1").unwrap().unwrap().status,
            QuestStatus::Published
        );

        f.give("c", "a");
        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(status.completed);
        assert!(status.newly_completed);
        assert!(status.completed_at.is_some());

        let quest = f.quests.find_by_id("q1").unwrap().unwrap();
        assert_eq!(quest.status, QuestStatus::Completed);
        assert_eq!(quest.completed_at, status.completed_at);
        assert_eq!(
            f.events.events(),
            vec![DomainEvent::quest_completed("q1", 3, 3)]
        );
    }

    #[tokio::test]
    async fn test_repeat_badges_from_one_giver_count_once() {
        let f = fixture(&["a", "b"]);
        f.give("a", "b");
        f.give("a", "b");
        f.give("a", "org");

        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert_eq!(status.badges_given, 1);
        assert!(!status.completed);
    }

    #[tokio::test]
    async fn test_completion_is_monotonic() {
        let f = fixture(&["a"]);
        f.give("a", "org");
        let first = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(first.newly_completed);

        f.quests.seed(quest_with_roster("q2", "org", &[]));
        let second = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(second.completed);
        assert!(!second.newly_completed);
        assert_eq!(second.completed_at, first.completed_at);
        assert_eq!(f.events.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_quest_is_never_completed() {
        let f = fixture(&["a"]);
        f.quests
            .set_status("q1", QuestStatus::Cancelled, None)
            .await
            .unwrap();
        f.give("a", "org");

        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(!status.completed);
        assert_eq!(
            f.quests.find_by_id("q1").unwrap().unwrap().status,
            QuestStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_concurrent_cancel_wins_over_stale_completion() {
        let f = fixture(&["a"]);
        f.quests
            .pin_stale_read(f.quests.find_by_id("q1").unwrap().unwrap());
        f.quests
            .set_status("q1", QuestStatus::Cancelled, None)
            .await
            .unwrap();
        f.give("a", "org");

        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(!status.completed);
        assert!(!status.newly_completed);
        assert!(f.events.is_empty());

        let stored = f.quests.list_all().unwrap();
        assert_eq!(stored[0].status, QuestStatus::Cancelled);
        assert!(stored[0].completed_at.is_none());
    }

    #[tokio::test]
    async fn test_stale_read_of_completed_quest_is_not_newly_completed() {
        let f = fixture(&["a"]);
        f.quests
            .pin_stale_read(f.quests.find_by_id("q1").unwrap().unwrap());
        let done_at = Utc::now();
        f.quests
            .set_status("q1", QuestStatus::Completed, Some(done_at))
            .await
            .unwrap();
        f.give("a", "org");

        let status = f.service.recompute("q1").await.unwrap().unwrap();
        assert!(status.completed);
        assert!(!status.newly_completed);
        assert_eq!(status.completed_at, Some(done_at));
        assert!(f.events.is_empty());
    }

    #[tokio::test]
    async fn test_missing_quest_or_empty_roster_is_skipped() {
        let f = fixture(&[]);
        f.give("a", "org");
        assert!(f.service.recompute("q1").await.unwrap().is_none());
        assert!(f.service.recompute("never-stored").await.unwrap().is_none());
        assert_eq!(
            f.quests.find_by_id("q1").unwrap().unwrap().status,
            QuestStatus::Published
        );
    }

    #[tokio::test]
    async fn test_read_failure_is_surfaced() {
        let f = fixture(&["a"]);
        f.badges.fail_reads(true);
        assert!(f.service.recompute("q1").await.unwrap_err().is_transport());
    }

    #[test]
    fn test_threshold_rule() {
        assert!(threshold_met(3, 3));
        assert!(threshold_met(4, 3));
        assert!(!threshold_met(2, 3));
    }
}
