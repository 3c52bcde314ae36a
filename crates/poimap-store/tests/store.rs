//! Integration tests for `LocationStore` actions against a wiremock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use poimap_api::LocationApiClient;
use poimap_core::{BoxBound, LngLat, Location, SearchForm, TypeOption};
use poimap_store::{LocationStore, MapPopup, Outcome, NO_HOVER, RESULTS_SEARCHING};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(server: &MockServer) -> LocationStore {
    let api = LocationApiClient::with_base_url(&server.uri(), 30, "poimap-test")
        .expect("client construction should not fail");
    LocationStore::new(api)
}

fn loc(id: i64, type_id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "type": format!("http://backend/types/{type_id}/"),
        "name": format!("Place {id}")
    })
}

fn ids(locations: &[Location]) -> Vec<i64> {
    locations.iter().map(|l| l.id).collect()
}

fn bound(offset: f64) -> BoxBound {
    BoxBound {
        ne: LngLat(10.0 + offset, 20.0),
        sw: LngLat(9.0 + offset, 19.0),
    }
}

fn catalog_body() -> serde_json::Value {
    serde_json::json!([
        { "id": 1, "name": "Cafe" },
        { "id": 2, "name": "Park" }
    ])
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/types/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .mount(server)
        .await;
}

async fn mount_catalog_with_delay(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/types/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog_body())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[derive(Default)]
struct CountingPopup {
    removed: AtomicUsize,
}

impl CountingPopup {
    fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }
}

impl MapPopup for CountingPopup {
    fn remove(&self) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn get_all_locations_populates_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            loc(1, 5),
            loc(2, 7),
            loc(3, 5)
        ])))
        .mount(&server)
        .await;

    let store = test_store(&server);
    let outcome = store.get_all_locations().await.expect("fetch should succeed");

    assert_eq!(outcome, Outcome::Applied);
    let state = store.snapshot();
    assert_eq!(ids(&state.results_list), vec![1, 2, 3]);
    assert_eq!(state.results_list, state.fetched_locations);
    assert_eq!(state.results_count, 3);
    assert_eq!(state.results_type, vec![5, 7]);
}

#[tokio::test]
async fn search_locations_sends_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .and(query_param("q", "museum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([loc(4, 9)])))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server);
    let mut form = SearchForm::new();
    form.insert("q".to_string(), serde_json::json!("museum"));
    form.insert("suburb".to_string(), serde_json::Value::Null);
    store.set_query_params(form);

    store.search_locations().await.expect("search should succeed");

    assert_eq!(ids(&store.results_list()), vec![4]);
    assert_eq!(store.results_count(), 1);
    assert_eq!(store.state().results_type, vec![9]);
}

#[tokio::test]
async fn get_locations_queries_by_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .and(query_param("ne", "10,20"))
        .and(query_param("sw", "9,19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            loc(1, 5),
            loc(2, 7)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server);
    store.get_locations(bound(0.0)).await.expect("fetch should succeed");

    assert_eq!(store.results_count(), 2);
}

#[tokio::test]
async fn failed_fetch_leaves_results_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server);
    let seeded: Vec<Location> =
        serde_json::from_value(serde_json::json!([loc(1, 5)])).unwrap();
    store.set_fetched_locations(seeded.clone());

    let result = store.get_all_locations().await;

    assert!(result.is_err(), "expected error, got: {result:?}");
    let state = store.snapshot();
    assert_eq!(state.fetched_locations, seeded);
    assert_eq!(state.results_list, seeded);
    assert_eq!(state.results_count, 1);
}

#[tokio::test]
async fn newer_fetch_wins_over_slower_older_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .and(query_param("ne", "10,20"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([loc(1, 5)]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .and(query_param("ne", "11,20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            loc(2, 7),
            loc(3, 7)
        ])))
        .mount(&server)
        .await;

    let store = test_store(&server);
    let (older, newer) = tokio::join!(store.get_locations(bound(0.0)), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.get_locations(bound(1.0)).await
    });

    assert_eq!(newer.expect("newer fetch should succeed"), Outcome::Applied);
    assert_eq!(older.expect("older fetch should succeed"), Outcome::Stale);
    assert_eq!(ids(&store.results_list()), vec![2, 3]);
    assert_eq!(store.state().results_type, vec![7]);
}

#[tokio::test]
async fn narrowing_types_during_full_catalog_load_keeps_default_filter() {
    let server = MockServer::start().await;
    mount_catalog_with_delay(&server, Duration::from_millis(200)).await;

    let store = test_store(&server);
    let (full, narrowed) = tokio::join!(store.fetch_all_types(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.set_all_types([2]).await
    });

    assert_eq!(full.expect("catalog fetch should succeed"), Outcome::Applied);
    assert_eq!(narrowed.expect("catalog fetch should succeed"), Outcome::Applied);
    let state = store.snapshot();
    assert_eq!(state.filter_types.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(
        state.all_types,
        vec![TypeOption {
            value: 2,
            text: "Park".to_string()
        }]
    );
}

#[tokio::test]
async fn full_catalog_load_after_narrowing_restores_every_option() {
    let server = MockServer::start().await;
    mount_catalog_with_delay(&server, Duration::from_millis(200)).await;

    let store = test_store(&server);
    let (narrowed, full) = tokio::join!(store.set_all_types([2]), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.fetch_all_types().await
    });

    assert_eq!(narrowed.expect("catalog fetch should succeed"), Outcome::Stale);
    assert_eq!(full.expect("catalog fetch should succeed"), Outcome::Applied);
    let state = store.snapshot();
    assert_eq!(state.filter_types.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(state.all_types.len(), 2);
}

#[tokio::test]
async fn newer_detail_fetch_wins_over_slower_older_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/8/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(loc(8, 2))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/9/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(loc(9, 3)))
        .mount(&server)
        .await;

    let store = test_store(&server);
    let (older, newer) = tokio::join!(store.get_location(8), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.get_location(9).await
    });

    assert_eq!(older.expect("detail fetch should succeed"), Outcome::Stale);
    assert_eq!(newer.expect("detail fetch should succeed"), Outcome::Applied);
    assert_eq!(store.state().location.as_ref().map(|l| l.id), Some(9));
}

#[tokio::test]
async fn flush_invalidates_in_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([loc(1, 5)]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = test_store(&server);
    let (outcome, ()) = tokio::join!(store.get_all_locations(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.flush_results_list();
    });

    assert_eq!(outcome.unwrap(), Outcome::Stale);
    let state = store.snapshot();
    assert!(state.results_list.is_empty());
    assert!(state.fetched_locations.is_empty());
    assert_eq!(state.results_count, 0);
}

#[tokio::test]
async fn searching_flag_is_replaced_by_fetch_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([loc(1, 5)])))
        .mount(&server)
        .await;

    let store = test_store(&server);
    store.set_results_count_to_searching();
    assert_eq!(store.results_count(), RESULTS_SEARCHING);
    assert!(store.state().is_searching());

    store.get_all_locations().await.unwrap();
    assert_eq!(store.results_count(), 1);
}

#[tokio::test]
async fn filter_then_resume_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            loc(1, 5),
            loc(2, 7)
        ])))
        .mount(&server)
        .await;

    let store = test_store(&server);
    store.get_all_locations().await.unwrap();

    store.set_filter_types([5]);
    store.filter_results_list();
    assert_eq!(ids(&store.results_list()), vec![1]);
    assert_eq!(store.results_count(), 1);

    store.resume_results_list();
    let state = store.snapshot();
    assert_eq!(state.results_list, state.fetched_locations);
    assert_eq!(state.results_count, 2);
}

#[tokio::test]
async fn get_location_sets_detail_and_flush_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(loc(8, 2)))
        .mount(&server)
        .await;

    let store = test_store(&server);
    assert_eq!(store.get_location(8).await.unwrap(), Outcome::Applied);
    assert_eq!(store.state().location.as_ref().map(|l| l.id), Some(8));

    store.flush_location();
    assert!(store.state().location.is_none());
}

#[tokio::test]
async fn failed_detail_fetch_keeps_previous_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(loc(8, 2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/9/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = test_store(&server);
    store.get_location(8).await.unwrap();
    assert!(store.get_location(9).await.is_err());

    assert_eq!(store.state().location.as_ref().map(|l| l.id), Some(8));
}

#[tokio::test]
async fn leaving_detail_view_discards_pending_detail_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/8/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(loc(8, 2))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = test_store(&server);
    let (outcome, ()) = tokio::join!(store.get_location(8), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.flush_location();
    });

    assert_eq!(outcome.unwrap(), Outcome::Stale);
    assert!(store.state().location.is_none());
}

#[tokio::test]
async fn fetch_all_types_selects_every_type() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let store = test_store(&server);
    store.fetch_all_types().await.unwrap();

    let state = store.snapshot();
    assert_eq!(state.filter_types.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(
        state.all_types,
        vec![
            TypeOption {
                value: 1,
                text: "Cafe".to_string()
            },
            TypeOption {
                value: 2,
                text: "Park".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn set_all_types_keeps_requested_types_only() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let store = test_store(&server);
    store.set_filter_types([1]);
    store.set_all_types([2]).await.unwrap();

    let state = store.snapshot();
    assert_eq!(
        state.all_types,
        vec![TypeOption {
            value: 2,
            text: "Park".to_string()
        }]
    );
    assert_eq!(state.filter_types.iter().copied().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn set_current_location_recentres_map() {
    let server = MockServer::start().await;
    let store = test_store(&server);

    store.set_center_location(LngLat(0.0, 0.0));
    store.set_current_location(LngLat(10.0, 20.0));

    let state = store.snapshot();
    assert_eq!(state.current_location, Some(LngLat(10.0, 20.0)));
    assert_eq!(state.center_location, Some(LngLat(10.0, 20.0)));
}

#[tokio::test]
async fn plain_setters_assign_fields() {
    let server = MockServer::start().await;
    let store = test_store(&server);

    store.set_direction_visibility(true);
    store.set_search_text(Some("harbour".to_string()));
    store.update_on_hover_location_id(12);
    store.update_box_bound(bound(0.0));
    store.set_results_type(vec![3, 1]);
    store.set_navbar(Some(Arc::new("navbar")));

    let state = store.snapshot();
    assert!(state.direction_visibility);
    assert_eq!(state.search_text.as_deref(), Some("harbour"));
    assert_eq!(state.on_hover_location_id, 12);
    assert_eq!(state.box_bound, Some(bound(0.0)));
    assert_eq!(state.results_type, vec![3, 1]);
    assert!(state.navbar.is_some());

    store.update_on_hover_location_id(NO_HOVER);
    assert_eq!(store.state().on_hover_location_id, NO_HOVER);
}

#[tokio::test]
async fn add_popup_removes_previous_popup_once() {
    let server = MockServer::start().await;
    let store = test_store(&server);

    let first = Arc::new(CountingPopup::default());
    let second = Arc::new(CountingPopup::default());

    store.add_popup(first.clone());
    assert_eq!(first.removed(), 0);

    store.add_popup(second.clone());
    assert_eq!(first.removed(), 1);
    assert_eq!(second.removed(), 0);
    assert!(store.state().location_popup.is_some());

    store.del_popup();
    assert_eq!(second.removed(), 1);
    assert!(store.state().location_popup.is_none());

    store.del_popup();
    assert_eq!(first.removed(), 1);
    assert_eq!(second.removed(), 1);
}

#[tokio::test]
async fn re_adding_live_popup_does_not_remove_it() {
    let server = MockServer::start().await;
    let store = test_store(&server);

    let popup = Arc::new(CountingPopup::default());
    store.add_popup(popup.clone());
    store.add_popup(popup.clone());

    assert_eq!(popup.removed(), 0);
    assert!(store.state().location_popup.is_some());
}

#[tokio::test]
async fn subscribers_see_each_action_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            loc(1, 5),
            loc(2, 7)
        ])))
        .mount(&server)
        .await;

    let store = test_store(&server);
    let mut rx = store.subscribe();
    assert!(!rx.has_changed().unwrap());

    store.get_all_locations().await.unwrap();
    assert!(rx.has_changed().unwrap());
    {
        let seen = rx.borrow_and_update();
        assert_eq!(seen.results_count, 2);
        assert_eq!(seen.results_list, seen.fetched_locations);
    }

    // Deleting a popup that is not there is not a change.
    store.del_popup();
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn location_from_results_uses_fetched_list() {
    let server = MockServer::start().await;
    let store = test_store(&server);
    let seeded: Vec<Location> =
        serde_json::from_value(serde_json::json!([loc(1, 5), loc(2, 7)])).unwrap();
    store.set_fetched_locations(seeded);

    assert_eq!(store.location_from_results(2).map(|l| l.id), Some(2));
    assert!(store.location_from_results(3).is_none());
}
