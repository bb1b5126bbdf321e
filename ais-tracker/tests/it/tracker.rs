use std::{sync::Arc, time::Duration};

use ais_tracker::{error::Error, startup::App};
use geo::Point;
use serde_json::json;
use vessel_core::{Mmsi, feature_collection};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::helper::{feed_pair, initialized_app, mock_registry, test_settings};

#[tokio::test]
async fn test_end_to_end_rescue_hope_scenario() {
    let server = MockServer::start().await;
    mock_registry(&server, json!([{"mmsi": 230123456, "name": "Rescue Hope"}])).await;

    let app = initialized_app(&server).await;
    assert!(app.followed().contains(&Mmsi::new("230123456")));

    let (mut writer, source) = feed_pair();
    writer
        .send(
            "vessels-v2/230123456/metadata",
            json!({"name": "Rescue Hope", "callsign": "OH123"}),
        )
        .await;
    writer
        .send(
            "vessels-v2/230123456/location",
            json!({
                "lat": 60.15,
                "lon": 24.95,
                "sog": 12.3,
                "cog": 90.0,
                "heading": 88,
                "timestamp": 1668075026,
            }),
        )
        .await;
    drop(writer);

    let result = app.run_test(source).await;
    assert!(matches!(result, Err(Error::StreamClosed { .. })));

    let features = app.snapshot_features();
    assert_eq!(1, features.len());

    let feature = &features[0];
    assert_eq!(Point::new(24.95, 60.15), feature.geometry);
    assert_eq!(Some(&json!("Rescue Hope")), feature.properties.get("name"));
    assert_eq!(Some(&json!("OH123")), feature.properties.get("callsign"));
    assert_eq!(Some(&json!(12.3)), feature.properties.get("sog"));
    assert_eq!(Some(&json!("230123456")), feature.properties.get("mmsi"));

    let collection = feature_collection(&features);
    assert_eq!(
        json!([24.95, 60.15]),
        collection["features"][0]["geometry"]["coordinates"]
    );
}

#[tokio::test]
async fn test_unfollowed_feed_traffic_never_renders() {
    let server = MockServer::start().await;
    mock_registry(&server, json!([{"mmsi": 111, "name": "MV Rescue One"}])).await;

    let app = initialized_app(&server).await;

    let (mut writer, source) = feed_pair();
    writer
        .send(
            "vessels-v2/999999999/location",
            json!({"lat": 60.0, "lon": 24.0}),
        )
        .await;
    drop(writer);

    app.run_test(source).await.unwrap_err();
    assert!(app.snapshot_features().is_empty());
}

#[tokio::test]
async fn test_bad_frames_do_not_stop_the_consumer() {
    let server = MockServer::start().await;
    mock_registry(&server, json!([{"mmsi": 111, "name": "MV Rescue One"}])).await;

    let app = initialized_app(&server).await;

    let (mut writer, source) = feed_pair();
    writer.send_raw("this is not json").await;
    writer
        .send("vessels-v2/111", json!({"lat": 1.0, "lon": 2.0}))
        .await;
    writer
        .send("vessels-v2/111/route", json!({"waypoints": []}))
        .await;
    writer
        .send("vessels-v2/111/location", json!({"lat": "north"}))
        .await;
    writer
        .send("vessels-v2/111/location", json!({"lat": 60.0, "lon": 24.0}))
        .await;
    drop(writer);

    app.run_test(source).await.unwrap_err();

    let features = app.snapshot_features();
    assert_eq!(1, features.len());
    assert_eq!(Point::new(24.0, 60.0), features[0].geometry);
}

#[tokio::test]
async fn test_fallback_metadata_comes_from_the_registry_seed() {
    let server = MockServer::start().await;
    mock_registry(
        &server,
        json!([{"mmsi": 111, "name": "MV Rescue One", "callSign": "OH111"}]),
    )
    .await;

    let app = initialized_app(&server).await;

    let (mut writer, source) = feed_pair();
    writer
        .send("vessels-v2/111/location", json!({"lat": 60.0, "lon": 24.0}))
        .await;
    drop(writer);

    app.run_test(source).await.unwrap_err();

    let features = app.snapshot_features();
    assert_eq!(Some(&json!("MV Rescue One")), features[0].properties.get("name"));
    assert_eq!(Some(&json!("OH111")), features[0].properties.get("callSign"));
}

#[tokio::test]
async fn test_follow_subscribes_new_vessels_exactly_once() {
    let server = MockServer::start().await;
    mock_registry(&server, json!([{"mmsi": 111, "name": "MV Rescue One"}])).await;

    let app = App::build(test_settings(
        format!("{}/vessels", server.uri()),
        Some("http://localhost:9/feed".to_string()),
    ));
    app.initialize().await;

    let feed = app.feed().unwrap();
    assert_eq!(vec!["vessels-v2/111/+".to_string()], feed.topics());

    app.follow(Mmsi::new("230123456"));
    app.follow(Mmsi::new("230123456"));

    assert_eq!(
        vec![
            "vessels-v2/111/+".to_string(),
            "vessels-v2/230123456/+".to_string()
        ],
        feed.topics()
    );
}

#[tokio::test]
async fn test_follow_reopens_the_live_stream_immediately() {
    let server = MockServer::start().await;
    mock_registry(&server, json!([{"mmsi": 111, "name": "MV Rescue One"}])).await;

    let app = Arc::new(App::build(test_settings(
        format!("{}/vessels", server.uri()),
        Some("http://localhost:9/feed".to_string()),
    )));
    app.initialize().await;

    let (mut writer, source) = feed_pair();
    writer
        .send("vessels-v2/111/location", json!({"lat": 60.0, "lon": 24.0}))
        .await;

    let consume = tokio::spawn({
        let app = app.clone();
        async move { app.consume_stream(source).await }
    });

    // Let the consumer settle on the open stream before following.
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.follow(Mmsi::new("230123456"));

    // The writer half is still open, so only the re-subscription interrupt
    // can end the consume call.
    let result = tokio::time::timeout(Duration::from_secs(5), consume)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());

    assert_eq!(
        vec![
            "vessels-v2/111/+".to_string(),
            "vessels-v2/230123456/+".to_string()
        ],
        app.feed().unwrap().topics()
    );
    assert_eq!(1, app.snapshot_features().len());
    drop(writer);
}

#[tokio::test]
#[should_panic(expected = "no feed address configured")]
async fn test_run_without_feed_address_fails_fast() {
    let app = App::build(test_settings("http://localhost:9/vessels".to_string(), None));
    app.run().await;
}

#[tokio::test]
async fn test_manually_followed_vessel_survives_registry_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vessels"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"mmsi": 111, "name": "MV Rescue One"}])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vessels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = initialized_app(&server).await;
    app.follow(Mmsi::new("230123456"));

    app.registry().refresh().await.unwrap();

    // The registry dropped everything, the followed set is a point-in-time
    // copy plus user additions.
    assert!(!app.registry().is_known(&Mmsi::new("111")));
    assert!(app.followed().contains(&Mmsi::new("111")));
    assert!(app.followed().contains(&Mmsi::new("230123456")));
}

#[tokio::test]
async fn test_degraded_mode_still_tracks_manual_vessels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vessels"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = initialized_app(&server).await;
    assert!(app.followed().is_empty());

    app.follow(Mmsi::new("230123456"));

    let (mut writer, source) = feed_pair();
    writer
        .send(
            "vessels-v2/230123456/location",
            json!({"lat": 60.15, "lon": 24.95}),
        )
        .await;
    drop(writer);

    app.run_test(source).await.unwrap_err();

    let features = app.snapshot_features();
    assert_eq!(1, features.len());
    assert_eq!(Mmsi::new("230123456"), features[0].mmsi);
}
