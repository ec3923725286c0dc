use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rota_api::{app, AppState};
use rota_availability::AvailabilitySettings;
use rota_shared::{BookingSlot, SlotStatus};
use rota_store::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const GUIDE: u128 = 0x2000;
const HOT_CHOCOLATE: u128 = 0x3001;
const SWIM_REQUIREMENT: u128 = 0x1001;

struct Harness {
    app: Router,
    store: Arc<InMemoryStore>,
    attraction_id: Uuid,
    today: NaiveDate,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let today = Utc::now().date_naive();
    let attraction_id = store.seed_demo(today).await;
    let state = AppState::new(store.clone(), store.clone(), AvailabilitySettings::default());
    Harness {
        app: app(state),
        store,
        attraction_id,
        today,
    }
}

impl Harness {
    /// Adds a morning slot on `date` with `booked` of 8 places taken
    async fn add_slot(&self, date: NaiveDate, booked: i32) -> Uuid {
        let id = Uuid::new_v4();
        let start = NaiveTime::from_hms_opt(7, 15, 0).unwrap();
        self.store
            .insert_slot(BookingSlot {
                id,
                attraction_id: self.attraction_id,
                resource_id: Some(Uuid::from_u128(GUIDE)),
                date,
                start_time: start,
                end_time: start + Duration::hours(2),
                max_capacity: 8,
                current_bookings: booked,
                price_override: None,
                status: SlotStatus::Available,
                resource: None,
            })
            .await;
        id
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn open_session(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                &format!("/v1/attractions/{}/sessions", self.attraction_id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn act(&self, session_id: &str, action: Value) -> Value {
        let (status, body) = self
            .send("POST", &format!("/v1/sessions/{session_id}/actions"), Some(action))
            .await;
        assert_eq!(status, StatusCode::OK, "action failed: {body}");
        body
    }

    /// Walks a fresh session up to the payment step on `slot_id`
    async fn drive_to_payment(&self, session_id: &str, date: NaiveDate, slot_id: Uuid) {
        self.act(session_id, json!({ "type": "select_date", "date": date })).await;
        self.act(session_id, json!({ "type": "next_step" })).await;
        self.act(
            session_id,
            json!({ "type": "select_slot", "slot_id": slot_id, "time": "7:15 AM" }),
        )
        .await;
        self.act(session_id, json!({ "type": "next_step" })).await; // staff
        self.act(session_id, json!({ "type": "next_step" })).await; // addons
        self.act(
            session_id,
            json!({ "type": "update_addon", "addon_id": Uuid::from_u128(HOT_CHOCOLATE), "quantity": 2 }),
        )
        .await;
        self.act(session_id, json!({ "type": "next_step" })).await; // requirements
        self.act(
            session_id,
            json!({ "type": "acknowledge_requirement", "requirement_id": Uuid::from_u128(SWIM_REQUIREMENT) }),
        )
        .await;
        self.act(session_id, json!({ "type": "next_step" })).await; // details
        self.act(
            session_id,
            json!({
                "type": "update_customer_info",
                "info": { "first_name": "Aroha", "last_name": "Ngata", "email": "aroha@example.com" }
            }),
        )
        .await;
        let body = self.act(session_id, json!({ "type": "next_step" })).await;
        assert_eq!(body["draft"]["step"], "payment");
    }
}

#[tokio::test]
async fn test_open_session_builds_steps_for_attraction() {
    let h = harness().await;
    let (status, body) = h
        .send("POST", &format!("/v1/attractions/{}/sessions", h.attraction_id), None)
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["steps"],
        json!(["date", "time", "staff", "addons", "requirements", "details", "payment", "confirmation"])
    );
    assert_eq!(body["draft"]["step"], "date");
    assert_eq!(body["draft"]["party_size"], 1);
    assert_eq!(body["can_go_back"], false);
    assert_eq!(body["quote"]["total"], 6500);
    assert!(body["slots"].is_null());
}

#[tokio::test]
async fn test_open_session_for_unknown_attraction_is_404() {
    let h = harness().await;
    let (status, body) = h
        .send("POST", &format!("/v1/attractions/{}/sessions", Uuid::new_v4()), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_next_step_blocked_until_date_selected() {
    let h = harness().await;
    let session_id = h.open_session().await;

    let body = h.act(&session_id, json!({ "type": "next_step" })).await;
    assert_eq!(body["applied"], false);
    assert_eq!(body["draft"]["step"], "date");
    assert_eq!(body["blocker"]["code"], "missing_date");

    let date = h.today + Duration::days(1);
    let body = h.act(&session_id, json!({ "type": "select_date", "date": date })).await;
    assert_eq!(body["can_proceed"], true);
    assert!(body["slots"].is_object());

    let body = h.act(&session_id, json!({ "type": "next_step" })).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["draft"]["step"], "time");
    assert_eq!(body["blocker"]["code"], "missing_slot");
}

#[tokio::test]
async fn test_party_size_and_addons_update_quote() {
    let h = harness().await;
    let session_id = h.open_session().await;

    h.act(&session_id, json!({ "type": "set_party_size", "size": 2 })).await;
    let body = h
        .act(
            &session_id,
            json!({ "type": "update_addon", "addon_id": Uuid::from_u128(HOT_CHOCOLATE), "quantity": 10 }),
        )
        .await;

    // Clamped to the add-on's max quantity of 3; 450 x 3 x 2 people
    assert_eq!(body["draft"]["selected_addons"][Uuid::from_u128(HOT_CHOCOLATE).to_string()], 3);
    assert_eq!(body["quote"]["addon_total"], 2700);
    assert_eq!(body["quote"]["total"], 13000 + 2700);
}

#[tokio::test]
async fn test_malformed_action_is_rejected() {
    let h = harness().await;
    let session_id = h.open_session().await;

    let (status, _) = h
        .send(
            "POST",
            &format!("/v1/sessions/{session_id}/actions"),
            Some(json!({ "type": "teleport" })),
        )
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_checkout_confirms_booking() {
    let h = harness().await;
    let date = h.today + Duration::days(2);
    let slot_id = h.add_slot(date, 0).await;
    let session_id = h.open_session().await;
    h.drive_to_payment(&session_id, date, slot_id).await;

    let (status, body) = h
        .send("POST", &format!("/v1/sessions/{session_id}/checkout"), None)
        .await;

    assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
    // 6500 base + 450 x 2 hot chocolates
    assert_eq!(body["confirmation"]["total"], 7400);
    assert!(body["confirmation"]["confirmation_code"]
        .as_str()
        .unwrap()
        .starts_with("RT-"));
    assert_eq!(body["draft"]["step"], "confirmation");
    assert_eq!(body["is_complete"], true);

    let slot = h.store.slot(slot_id).await.unwrap();
    assert_eq!(slot.current_bookings, 1);
    assert_eq!(h.store.bookings().await.len(), 1);
}

#[tokio::test]
async fn test_checkout_before_payment_step_is_unprocessable() {
    let h = harness().await;
    let session_id = h.open_session().await;

    let (status, body) = h
        .send("POST", &format!("/v1/sessions/{session_id}/checkout"), None)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "wrong_step");
}

#[tokio::test]
async fn test_checkout_on_full_slot_returns_to_time_selection() {
    let h = harness().await;
    let date = h.today + Duration::days(3);
    let slot_id = h.add_slot(date, 0).await;
    let session_id = h.open_session().await;
    h.drive_to_payment(&session_id, date, slot_id).await;

    // Someone else takes every place while the customer is paying
    let rival = h.open_session().await;
    h.act(&rival, json!({ "type": "set_party_size", "size": 8 })).await;
    h.drive_to_payment(&rival, date, slot_id).await;
    let (status, _) = h
        .send("POST", &format!("/v1/sessions/{rival}/checkout"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .send("POST", &format!("/v1/sessions/{session_id}/checkout"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_taken");

    let (status, body) = h.send("GET", &format!("/v1/sessions/{session_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["step"], "time");
    assert!(body["draft"]["selected_slot_id"].is_null());
    assert_eq!(body["draft"]["selected_date"], json!(date));
    assert_eq!(h.store.slot(slot_id).await.unwrap().current_bookings, 8);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let h = harness().await;
    let missing = Uuid::new_v4();

    let (status, _) = h.send("GET", &format!("/v1/sessions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .send(
            "POST",
            &format!("/v1/sessions/{missing}/actions"),
            Some(json!({ "type": "next_step" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session() {
    let h = harness().await;
    let session_id = h.open_session().await;

    let (status, _) = h.send("DELETE", &format!("/v1/sessions/{session_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = h.send("GET", &format!("/v1/sessions/{session_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slots_endpoint_filters_by_party_size() {
    let h = harness().await;
    let date = h.today + Duration::days(4);
    let roomy = h.add_slot(date, 0).await;
    let nearly_full = h.add_slot(date, 7).await;

    let (status, body) = h
        .send(
            "GET",
            &format!("/v1/attractions/{}/slots?date={date}&party_size=2", h.attraction_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&roomy.to_string().as_str()));
    assert!(!ids.contains(&nearly_full.to_string().as_str()));
    assert_eq!(body["party_size"], 2);
}

#[tokio::test]
async fn test_slots_endpoint_requires_date() {
    let h = harness().await;
    let (status, _) = h
        .send("GET", &format!("/v1/attractions/{}/slots", h.attraction_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calendar_covers_requested_window() {
    let h = harness().await;
    let start = h.today;
    let end = h.today + Duration::days(6);

    let (status, body) = h
        .send(
            "GET",
            &format!("/v1/attractions/{}/calendar?start={start}&end={end}", h.attraction_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let days = body.as_object().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[&start.to_string()]["total_slots"], 4);
}

#[tokio::test]
async fn test_calendar_window_is_bounded() {
    let h = harness().await;
    let end = h.today + Duration::days(800);
    let (status, body) = h
        .send(
            "GET",
            &format!("/v1/attractions/{}/calendar?start={}&end={end}", h.attraction_id, h.today),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_catalog_hides_package_outside_party_range() {
    let h = harness().await;

    let (status, body) = h
        .send("GET", &format!("/v1/attractions/{}/catalog?party_size=1", h.attraction_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addons"].as_array().unwrap().len(), 2);
    assert!(body["packages"].as_array().unwrap().is_empty());

    let (_, body) = h
        .send("GET", &format!("/v1/attractions/{}/catalog?party_size=2", h.attraction_id), None)
        .await;
    assert_eq!(body["packages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reviews_endpoint_summarises_ratings() {
    let h = harness().await;
    let (status, body) = h
        .send("GET", &format!("/v1/attractions/{}/reviews", h.attraction_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(body["featured"].as_array().unwrap().len(), 1);
    assert_eq!(body["summary"]["total_count"], 2);
}

#[tokio::test]
async fn test_staff_endpoint_lists_guides() {
    let h = harness().await;
    let (status, body) = h
        .send("GET", &format!("/v1/attractions/{}/staff", h.attraction_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["staff"].as_array().unwrap().len(), 2);
}

impl Harness {
    /// Re-reads the session until its polled calendar satisfies `ready`
    async fn wait_for_calendar(&self, session_id: &str, ready: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..100 {
            let (status, body) = self.send("GET", &format!("/v1/sessions/{session_id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            if !body["calendar"]["data"].is_null() && ready(&body["calendar"]["data"]) {
                return body["calendar"]["data"].clone();
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("session calendar never settled");
    }
}

#[tokio::test]
async fn test_session_polls_calendar_for_party_size() {
    let h = harness().await;
    let date = h.today + Duration::days(5);
    h.add_slot(date, 0).await;
    let session_id = h.open_session().await;
    let key = date.to_string();

    let calendar = h
        .wait_for_calendar(&session_id, |data| data[&key]["slots_available"].as_u64() > Some(0))
        .await;
    assert!(calendar[&key]["total_slots"].as_u64() > Some(0));

    // No slot holds nine
    h.act(&session_id, json!({ "type": "set_party_size", "size": 9 })).await;
    let calendar = h
        .wait_for_calendar(&session_id, |data| data[&key]["slots_available"] == 0)
        .await;
    assert!(calendar
        .as_object()
        .unwrap()
        .values()
        .all(|day| day["slots_available"] == 0));
}
