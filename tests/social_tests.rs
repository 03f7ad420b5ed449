mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_tweet_lifecycle() {
    let app = TestApp::new();
    let (author_id, token) = app.signup("author1").await;
    let (_, other_token) = app.signup("reader1").await;

    let empty = app
        .post("/api/v1/tweets", Some(&token), json!({ "content": "   " }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.message(), "Content can not be empty");

    let created = app
        .post("/api/v1/tweets", Some(&token), json!({ "content": "  hello world " }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.message(), "Tweet created successfully!");
    assert_eq!(created.data()["content"], "hello world");
    let tweet_id = created.data()["_id"].as_str().unwrap().to_string();

    let listed = app
        .get(&format!("/api/v1/tweets/user/{author_id}"), Some(&other_token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data()["userName"], "author1");
    assert_eq!(listed.data()["tweets"][0]["_id"], tweet_id.as_str());
    assert_eq!(listed.data()["tweets"][0]["content"], "hello world");

    let invalid_user = app.get("/api/v1/tweets/user/xyz", Some(&token)).await;
    assert_eq!(invalid_user.status, StatusCode::BAD_REQUEST);
    let unknown_user = app
        .get("/api/v1/tweets/user/65f000000000000000000000", Some(&token))
        .await;
    assert_eq!(unknown_user.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_user.message(), "User not found!");

    let not_owner = app
        .patch(
            &format!("/api/v1/tweets/{tweet_id}"),
            Some(&other_token),
            json!({ "newContent": "hijacked" }),
        )
        .await;
    assert_eq!(not_owner.status, StatusCode::NOT_FOUND);

    let no_content = app
        .patch(&format!("/api/v1/tweets/{tweet_id}"), Some(&token), json!({}))
        .await;
    assert_eq!(no_content.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_content.message(), "Content is missing!");

    let updated = app
        .patch(
            &format!("/api/v1/tweets/{tweet_id}"),
            Some(&token),
            json!({ "newContent": "edited" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["content"], "edited");

    let liked = app
        .post(&format!("/api/v1/likes/toggle/t/{tweet_id}"), Some(&other_token), json!({}))
        .await;
    assert_eq!(liked.status, StatusCode::CREATED);
    assert_eq!(liked.message(), "Tweet Liked!");

    let deleted = app
        .delete(&format!("/api/v1/tweets/{tweet_id}"), Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.message(), "Tweet deleted successfully!");

    let again = app
        .delete(&format!("/api/v1/tweets/{tweet_id}"), Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let like_gone_target = app
        .post(&format!("/api/v1/likes/toggle/t/{tweet_id}"), Some(&other_token), json!({}))
        .await;
    assert_eq!(like_gone_target.status, StatusCode::NOT_FOUND);
    assert_eq!(like_gone_target.message(), "Tweet not found!");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = TestApp::new();
    let (_, owner_token) = app.signup("creator1").await;
    let (_, fan_token) = app.signup("bigfan1").await;
    let video_id = app.publish_video(&owner_token, "Talk").await;

    let empty = app
        .post(&format!("/api/v1/comments/{video_id}"), Some(&fan_token), json!({ "content": "" }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.message(), "Content cannot be empty!");

    let missing_video = app
        .post(
            "/api/v1/comments/65f000000000000000000000",
            Some(&fan_token),
            json!({ "content": "hi" }),
        )
        .await;
    assert_eq!(missing_video.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_video.message(), "Video not found!");

    let mut comment_ids = Vec::new();
    for text in ["one", "two", "three"] {
        let created = app
            .post(&format!("/api/v1/comments/{video_id}"), Some(&fan_token), json!({ "content": text }))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        comment_ids.push(created.data()["_id"].as_str().unwrap().to_string());
    }

    let page = app
        .get(&format!("/api/v1/comments/{video_id}?page=1&limit=2"), Some(&owner_token))
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.message(), "Fetched video comments successfully!");
    assert_eq!(page.data()["totalDocs"], 3);
    assert_eq!(page.data()["docs"][0]["content"], "three");
    assert_eq!(page.data()["docs"][0]["owner"]["userName"], "bigfan1");

    let invalid = app.get("/api/v1/comments/nope", Some(&owner_token)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid videoId!");

    let target = &comment_ids[0];
    let forbidden = app
        .patch(
            &format!("/api/v1/comments/c/{target}"),
            Some(&owner_token),
            json!({ "newComment": "rewritten" }),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let updated = app
        .patch(
            &format!("/api/v1/comments/c/{target}"),
            Some(&fan_token),
            json!({ "newComment": "rewritten" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.message(), "Comment Updated successfully!");
    assert_eq!(updated.data()["content"], "rewritten");

    let liked = app
        .post(&format!("/api/v1/likes/toggle/c/{target}"), Some(&owner_token), json!({}))
        .await;
    assert_eq!(liked.message(), "Comment Liked!");

    let forbidden_delete = app
        .delete(&format!("/api/v1/comments/c/{target}"), Some(&owner_token))
        .await;
    assert_eq!(forbidden_delete.status, StatusCode::FORBIDDEN);

    let deleted = app
        .delete(&format!("/api/v1/comments/c/{target}"), Some(&fan_token))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(deleted.body.is_null());

    let missing = app
        .delete(&format!("/api/v1/comments/c/{target}"), Some(&fan_token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Comment not found!");
}

#[tokio::test]
async fn test_like_toggle_and_liked_videos() {
    let app = TestApp::new();
    let (_, owner_token) = app.signup("creator1").await;
    let (_, fan_token) = app.signup("bigfan1").await;
    let video_id = app.publish_video(&owner_token, "Likeable").await;

    let none = app.get("/api/v1/likes/videos", Some(&fan_token)).await;
    assert_eq!(none.status, StatusCode::NOT_FOUND);
    assert_eq!(none.message(), "Liked videos missing!");

    let invalid = app
        .post("/api/v1/likes/toggle/v/bad-id", Some(&fan_token), json!({}))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid video Id!");

    let liked = app
        .post(&format!("/api/v1/likes/toggle/v/{video_id}"), Some(&fan_token), json!({}))
        .await;
    assert_eq!(liked.status, StatusCode::CREATED);
    assert_eq!(liked.message(), "Video Liked!");

    let listed = app.get("/api/v1/likes/videos", Some(&fan_token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.message(), "Liked Videos fetched successfully!");
    assert_eq!(listed.data()[0]["_id"], video_id.as_str());
    assert_eq!(listed.data()[0]["owner"]["userName"], "creator1");

    let stats = app.get("/api/v1/dashboard/stats", Some(&owner_token)).await;
    assert_eq!(stats.data()["totalLikes"], 1);

    let unliked = app
        .post(&format!("/api/v1/likes/toggle/v/{video_id}"), Some(&fan_token), json!({}))
        .await;
    assert_eq!(unliked.status, StatusCode::OK);
    assert_eq!(unliked.message(), "Video unliked!");

    let after = app.get("/api/v1/likes/videos", Some(&fan_token)).await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscription_toggle_and_listings() {
    let app = TestApp::new();
    let (channel_id, channel_token) = app.signup("creator1").await;
    let (subscriber_id, subscriber_token) = app.signup("watcher1").await;

    let own = app
        .post(
            &format!("/api/v1/subscriptions/c/{channel_id}"),
            Some(&channel_token),
            json!({}),
        )
        .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post(
            "/api/v1/subscriptions/c/65f000000000000000000000",
            Some(&subscriber_token),
            json!({}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let invalid = app
        .post("/api/v1/subscriptions/c/bad", Some(&subscriber_token), json!({}))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.message(), "Invalid channel id!");

    let subscribed = app
        .post(
            &format!("/api/v1/subscriptions/c/{channel_id}"),
            Some(&subscriber_token),
            json!({}),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED);
    assert_eq!(subscribed.message(), "Channel Subscribed!");

    let subscribers = app
        .get(&format!("/api/v1/subscriptions/c/{channel_id}"), Some(&channel_token))
        .await;
    assert_eq!(subscribers.status, StatusCode::OK);
    assert_eq!(subscribers.data()["total"], 1);
    assert_eq!(subscribers.data()["subscribers"][0]["userName"], "watcher1");

    let channels = app
        .get(&format!("/api/v1/subscriptions/u/{subscriber_id}"), Some(&subscriber_token))
        .await;
    assert_eq!(channels.status, StatusCode::OK);
    assert_eq!(channels.data()[0]["userName"], "creator1");

    let bad_subscriber = app.get("/api/v1/subscriptions/u/bad", Some(&subscriber_token)).await;
    assert_eq!(bad_subscriber.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_subscriber.message(), "Invalid Subscriber Id!");

    let unsubscribed = app
        .post(
            &format!("/api/v1/subscriptions/c/{channel_id}"),
            Some(&subscriber_token),
            json!({}),
        )
        .await;
    assert_eq!(unsubscribed.status, StatusCode::OK);
    assert_eq!(unsubscribed.message(), "Channel unsubscribed!");

    let empty = app
        .get(&format!("/api/v1/subscriptions/u/{subscriber_id}"), Some(&subscriber_token))
        .await;
    assert_eq!(empty.status, StatusCode::NOT_FOUND);
    assert_eq!(empty.message(), "Subscribed Channels not found!");

    let none = app
        .get(&format!("/api/v1/subscriptions/c/{channel_id}"), Some(&channel_token))
        .await;
    assert_eq!(none.data()["total"], 0);
}
