//! The session's published state snapshot.

use content_core::{
    route, ContentResponse, CoupleSettings, DailyContent, RouteInputs, RoutingState,
};

/// One consistent view of the session, published by the session actor on
/// every change. Consumers only read; the actor is the single writer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub couple_id: String,
    /// Latest observed couple settings, if any.
    pub settings: Option<CoupleSettings>,
    /// Today's content document, if one exists yet.
    pub content: Option<DailyContent>,
    /// Transcript for the current content, ascending by `responded_at`.
    pub responses: Vec<ContentResponse>,
    /// Expected content day, recomputed from settings.
    pub current_day: u32,
    pub intro_seen: bool,
    pub subscribed: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Initial snapshot for a freshly attached session.
    pub fn new(couple_id: impl Into<String>) -> Self {
        Self {
            couple_id: couple_id.into(),
            settings: None,
            content: None,
            responses: Vec::new(),
            current_day: 1,
            intro_seen: false,
            subscribed: false,
            loading: true,
            error: None,
        }
    }

    /// Whether the partner side of the couple is connected and active.
    pub fn partner_connected(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.is_active)
    }

    /// Id of the current content document, if any.
    pub fn content_id(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.id.as_str())
    }

    /// Derive the routing state for this snapshot.
    pub fn routing(&self, free_day_limit: u32) -> RoutingState {
        route(&RouteInputs {
            has_connected_partner: self.partner_connected(),
            has_seen_intro: self.intro_seen,
            is_subscribed: self.subscribed,
            current_day: self.current_day,
            free_day_limit,
            error: self.error.clone(),
            is_loading: self.loading,
        })
    }
}

/// Re-sort a transcript ascending by server timestamp (id as tie-breaker).
/// Applied from scratch on every listener delivery so out-of-order or
/// replayed deliveries self-heal.
pub fn sort_responses(responses: &mut [ContentResponse]) {
    responses.sort_by(|a, b| {
        a.responded_at
            .cmp(&b.responded_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Pick the document whose `scheduled_date` equals today. Recomputed from
/// scratch on every snapshot; an empty result signals "needs generation",
/// not an error.
pub fn select_today(docs: &[DailyContent], today: &str) -> Option<DailyContent> {
    docs.iter().find(|c| c.scheduled_date == today).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn response(id: &str, hour: u32) -> ContentResponse {
        ContentResponse {
            id: id.to_string(),
            content_id: "content-1".to_string(),
            user_id: "user-a".to_string(),
            user_name: "Alex".to_string(),
            text: "hi".to_string(),
            responded_at: Utc.with_ymd_and_hms(2026, 8, 24, hour, 0, 0).unwrap(),
        }
    }

    fn content(id: &str, date: &str) -> DailyContent {
        DailyContent {
            id: id.to_string(),
            couple_id: "couple-1".to_string(),
            scheduled_date: date.to_string(),
            scheduled_date_time: Utc.with_ymd_and_hms(2026, 8, 24, 8, 0, 0).unwrap(),
            content_key: "daily_question_1".to_string(),
            is_completed: false,
            is_saved: false,
        }
    }

    #[test]
    fn test_sort_responses_heals_out_of_order_delivery() {
        let mut responses = vec![response("r3", 15), response("r1", 9), response("r2", 12)];
        sort_responses(&mut responses);
        let ids: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2", "r3"]);
    }

    #[test]
    fn test_sort_responses_ties_break_on_id() {
        let mut responses = vec![response("rb", 9), response("ra", 9)];
        sort_responses(&mut responses);
        assert_eq!(responses[0].id, "ra");
    }

    #[test]
    fn test_select_today_matches_date_only() {
        let docs = vec![content("c-old", "2026-08-23"), content("c-new", "2026-08-24")];
        let selected = select_today(&docs, "2026-08-24").unwrap();
        assert_eq!(selected.id, "c-new");
        assert!(select_today(&docs, "2026-08-25").is_none());
    }

    #[test]
    fn test_initial_snapshot_routes_to_loading() {
        let snapshot = SessionSnapshot::new("couple-1");
        assert_eq!(snapshot.routing(3), RoutingState::Loading);
    }

    #[test]
    fn test_partner_connected_requires_active_settings() {
        let mut snapshot = SessionSnapshot::new("couple-1");
        assert!(!snapshot.partner_connected());

        snapshot.settings = Some(CoupleSettings {
            couple_id: "couple-1".to_string(),
            start_date: Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap(),
            timezone: "UTC".to_string(),
            current_day: 1,
            is_active: false,
        });
        assert!(!snapshot.partner_connected());

        if let Some(settings) = snapshot.settings.as_mut() {
            settings.is_active = true;
        }
        assert!(snapshot.partner_connected());
    }
}
