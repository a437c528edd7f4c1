//! Upload session integration tests.
//!
//! Run with: `cargo test -p tutora-api --test sessions_test`

mod helpers;

use helpers::{api_path, bearer, post_chunk, session_chunk_form, setup_test_app, STORE_BASE_URL};
use serde_json::json;

async fn start_session(app: &helpers::TestApp, name: &str, total: u32) -> serde_json::Value {
    let response = app
        .client()
        .post(&api_path("/videos/uploads"))
        .add_header("Authorization", bearer())
        .json(&json!({ "originalname": name, "totalChunks": total, "mimetype": "video/mp4" }))
        .await;
    assert_eq!(response.status_code(), 201);
    response.json()
}

#[tokio::test]
async fn test_session_upload_publishes_under_session_object_name() {
    let app = setup_test_app().await;
    let client = app.client();

    let session = start_session(&app, "week 1.mp4", 2).await;
    let upload_id = session["uploadId"].as_str().unwrap().to_string();
    let object_name = session["objectName"].as_str().unwrap().to_string();
    assert_eq!(object_name, format!("{}-week1.mp4", upload_id));
    assert_eq!(session["totalChunks"], 2);

    let first = post_chunk(client, session_chunk_form(vec![1u8; 30], 0, 2, "week 1.mp4", &upload_id)).await;
    assert_eq!(first.status_code(), 200);

    let progress = client
        .get(&api_path(&format!("/videos/uploads/{}", upload_id)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(progress.status_code(), 200);
    let progress: serde_json::Value = progress.json();
    assert_eq!(progress["receivedChunks"], 1);
    assert_eq!(progress["originalName"], "week 1.mp4");

    let last = post_chunk(client, session_chunk_form(vec![2u8; 30], 1, 2, "week 1.mp4", &upload_id)).await;
    assert_eq!(last.status_code(), 200);
    let body: serde_json::Value = last.json();
    assert_eq!(body["file"]["filename"], object_name.as_str());
    assert_eq!(
        body["file"]["videoUrl"],
        format!("{}/{}", STORE_BASE_URL, object_name)
    );
    assert!(app.store().get(&object_name).await.is_some());

    // the session ends with its final chunk
    let gone = client
        .get(&api_path(&format!("/videos/uploads/{}", upload_id)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(gone.status_code(), 404);
}

#[tokio::test]
async fn test_sessions_with_the_same_file_name_do_not_collide() {
    let app = setup_test_app().await;
    let client = app.client();

    let a = start_session(&app, "same.mp4", 2).await;
    let b = start_session(&app, "same.mp4", 2).await;
    let a_id = a["uploadId"].as_str().unwrap().to_string();
    let b_id = b["uploadId"].as_str().unwrap().to_string();

    post_chunk(client, session_chunk_form(b"A0".to_vec(), 0, 2, "same.mp4", &a_id)).await;
    post_chunk(client, session_chunk_form(b"B0".to_vec(), 0, 2, "same.mp4", &b_id)).await;
    let a_done = post_chunk(client, session_chunk_form(b"A1".to_vec(), 1, 2, "same.mp4", &a_id)).await;
    let b_done = post_chunk(client, session_chunk_form(b"B1".to_vec(), 1, 2, "same.mp4", &b_id)).await;
    assert_eq!(a_done.status_code(), 200);
    assert_eq!(b_done.status_code(), 200);

    let a_object = app.store().get(a["objectName"].as_str().unwrap()).await.unwrap();
    let b_object = app.store().get(b["objectName"].as_str().unwrap()).await.unwrap();
    assert_eq!(&a_object.data[..], b"A0A1");
    assert_eq!(&b_object.data[..], b"B0B1");
}

#[tokio::test]
async fn test_out_of_order_session_chunk_is_a_conflict() {
    let app = setup_test_app().await;

    let session = start_session(&app, "order.mp4", 3).await;
    let upload_id = session["uploadId"].as_str().unwrap().to_string();

    let response = post_chunk(
        app.client(),
        session_chunk_form(vec![0u8; 10], 1, 3, "order.mp4", &upload_id),
    )
    .await;
    assert_eq!(response.status_code(), 409);
    assert!(app.staged_parts().is_empty());
}

#[tokio::test]
async fn test_total_chunks_mismatch_is_a_conflict() {
    let app = setup_test_app().await;

    let session = start_session(&app, "count.mp4", 3).await;
    let upload_id = session["uploadId"].as_str().unwrap().to_string();

    let response = post_chunk(
        app.client(),
        session_chunk_form(vec![0u8; 10], 0, 4, "count.mp4", &upload_id),
    )
    .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup_test_app().await;
    let unknown = uuid::Uuid::new_v4().to_string();

    let chunk = post_chunk(
        app.client(),
        session_chunk_form(vec![0u8; 10], 0, 1, "x.mp4", &unknown),
    )
    .await;
    assert_eq!(chunk.status_code(), 404);

    let abort = app
        .client()
        .delete(&api_path(&format!("/videos/uploads/{}", unknown)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(abort.status_code(), 404);
}

#[tokio::test]
async fn test_abort_discards_staged_chunks() {
    let app = setup_test_app().await;

    let session = start_session(&app, "abort.mp4", 3).await;
    let upload_id = session["uploadId"].as_str().unwrap().to_string();

    post_chunk(app.client(), session_chunk_form(vec![0u8; 10], 0, 3, "abort.mp4", &upload_id)).await;
    assert_eq!(app.staged_parts().len(), 1);

    let response = app
        .client()
        .delete(&api_path(&format!("/videos/uploads/{}", upload_id)))
        .add_header("Authorization", bearer())
        .await;
    assert_eq!(response.status_code(), 204);
    assert!(app.staged_parts().is_empty());
}

#[tokio::test]
async fn test_start_session_rejects_non_video_type() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/videos/uploads"))
        .add_header("Authorization", bearer())
        .json(&json!({ "originalname": "slides.pdf", "totalChunks": 2, "mimetype": "application/pdf" }))
        .await;
    assert_eq!(response.status_code(), 400);
}
