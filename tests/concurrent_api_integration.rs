//! Concurrent API integration tests
//!
//! These tests verify that the API correctly handles concurrent operations,
//! particularly for short code creation which is a critical operation.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use linklet::api;
use linklet::clock::ManualClock;
use linklet::models::ClickInfo;
use linklet::service::{CreateShortUrl, ResolutionService, ServiceError};
use linklet::storage::{MemoryStorage, Storage};
use linklet::telemetry::Telemetry;
use rand::RngExt;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create a service over an in-memory store driven by a manual clock
fn create_test_service() -> (Arc<ManualClock>, Arc<MemoryStorage>, Arc<ResolutionService>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    let service = Arc::new(ResolutionService::new(
        storage.clone(),
        Telemetry::disabled(),
        "http://localhost:3000",
    ));
    (clock, storage, service)
}

fn create_test_router(service: Arc<ResolutionService>) -> Router {
    api::create_api_router(service)
}

fn create_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/shorturls")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_short_code_creation() {
    // Test that concurrent short code creation handles conflicts correctly
    let (_clock, storage, service) = create_test_service();
    let app = create_test_router(service);

    // Spawn multiple concurrent requests to create the same short code
    let mut handles = vec![];

    for i in 0..10 {
        let app_clone = app.clone();
        let handle = tokio::spawn(async move {
            let body = format!(
                r#"{{"url": "https://example.com/{}", "shortcode": "concurrent"}}"#,
                i
            );
            app_clone.oneshot(create_request(body)).await.unwrap()
        });
        handles.push((i, handle));
    }

    // Collect results
    let mut success_count = 0;
    let mut conflict_count = 0;

    for (i, handle) in handles {
        match handle.await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::CREATED {
                    success_count += 1;
                } else if status == StatusCode::CONFLICT {
                    conflict_count += 1;
                } else {
                    println!("Request {} got unexpected status: {}", i, status);
                }
            }
            Err(e) => {
                panic!("Request {} failed: {:?}", i, e);
            }
        }
    }

    // Exactly one should succeed, others should get conflict
    assert_eq!(success_count, 1, "Exactly one creation should succeed");
    assert_eq!(conflict_count, 9, "All others should get conflict (409)");
    assert_eq!(storage.count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_different_short_codes() {
    // Test that concurrent creation of different short codes all succeed
    let (_clock, storage, service) = create_test_service();
    let app = create_test_router(service);

    // Spawn multiple concurrent requests with different short codes
    let mut handles = vec![];

    for i in 0..10 {
        let app_clone = app.clone();
        let handle = tokio::spawn(async move {
            let body = format!(
                r#"{{"url": "https://example.com", "shortcode": "test{:03}"}}"#,
                i
            );
            app_clone.oneshot(create_request(body)).await.unwrap()
        });
        handles.push(handle);
    }

    // All should succeed
    let mut success_count = 0;

    for handle in handles {
        match handle.await {
            Ok(response) => {
                if response.status() == StatusCode::CREATED {
                    success_count += 1;
                }
            }
            Err(e) => {
                panic!("Request failed: {:?}", e);
            }
        }
    }

    assert_eq!(success_count, 10, "All 10 creations should succeed");
    assert_eq!(storage.count().await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generated_codes_are_unique() {
    let (_clock, storage, service) = create_test_service();
    let app = create_test_router(service);

    let mut handles = vec![];
    for _ in 0..100 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            let body = r#"{"url": "https://example.com"}"#.to_string();
            let response = app_clone.oneshot(create_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: Value = serde_json::from_slice(&body).unwrap();
            json["shortLink"].as_str().unwrap().to_string()
        }));
    }

    let mut links = HashSet::new();
    for handle in handles {
        links.insert(handle.await.unwrap());
    }

    assert_eq!(links.len(), 100, "Every generated link should be distinct");
    assert_eq!(storage.count().await, 100);
}

#[tokio::test]
async fn test_concurrent_url_lookups() {
    // Test that concurrent lookups of the same URL work correctly
    let (_clock, storage, service) = create_test_service();

    service
        .create_short_url(CreateShortUrl {
            url: "https://example.com".to_string(),
            validity_minutes: None,
            custom_code: Some("lookup".to_string()),
        })
        .await
        .unwrap();

    // Spawn many concurrent lookup requests
    let mut handles = vec![];

    for _ in 0..50 {
        let storage_clone = storage.clone();
        let handle = tokio::spawn(async move { storage_clone.get("lookup").await });
        handles.push(handle);
    }

    // All should succeed and return the same URL
    let mut success_count = 0;

    for handle in handles {
        if let Ok(Some(record)) = handle.await {
            assert_eq!(record.shortcode, "lookup");
            assert_eq!(record.original_url, "https://example.com/");
            success_count += 1;
        }
    }

    assert_eq!(success_count, 50, "All 50 lookups should succeed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_race_expiry() {
    // Resolutions racing the expiry instant either redirect or see NotFound
    let (clock, storage, service) = create_test_service();

    service
        .create_short_url(CreateShortUrl {
            url: "https://example.com".to_string(),
            validity_minutes: Some(1.0),
            custom_code: Some("race".to_string()),
        })
        .await
        .unwrap();

    // Resolve once before the race so at least one click is guaranteed
    service.resolve("race", ClickInfo::default()).await.unwrap();

    let clock_clone = clock.clone();
    let expire_handle = tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
        clock_clone.advance(Duration::minutes(2));
    });

    let mut handles = vec![];
    let mut rng = rand::rng();
    for _ in 0..200 {
        let service_clone = service.clone();
        let sleep_duration = tokio::time::Duration::from_micros(rng.random_range(0..2000));
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(sleep_duration).await;
            service_clone.resolve("race", ClickInfo::default()).await
        }));
    }

    expire_handle.await.unwrap();

    for handle in handles {
        match handle.await.unwrap() {
            Ok(url) => assert_eq!(url, "https://example.com/"),
            Err(e) => assert_eq!(e, ServiceError::NotFound),
        }
    }

    // Final state is expired and evicted
    assert_eq!(
        service.resolve("race", ClickInfo::default()).await,
        Err(ServiceError::NotFound)
    );
    assert!(!storage.exists("race").await);
}
