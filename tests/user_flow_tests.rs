mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{MultipartBody, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_user_without_secrets() {
    let app = TestApp::new();

    let response = app.register("Alice01").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "User registered successfully !");
    assert_eq!(response.body["success"], true);

    let user = response.data();
    assert_eq!(user["userName"], "alice01");
    assert_eq!(user["email"], "alice01@example.com");
    assert_eq!(user["coverImage"], "");
    assert!(user["avatar"].as_str().unwrap().starts_with("/uploads/"));
    assert!(user.get("password").is_none());
    assert!(user.get("refreshToken").is_none());
    assert!(app.media_exists(user["avatar"].as_str().unwrap()));
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    assert_eq!(app.register("alice01").await.status, StatusCode::CREATED);

    let duplicate = app.register("alice01").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.message(), "User with username or email already exists ");
    assert_eq!(duplicate.body["success"], false);
    assert!(duplicate.body["data"].is_null());

    let short_name = app.register("abc").await;
    assert_eq!(short_name.status, StatusCode::BAD_REQUEST);

    let no_avatar = MultipartBody::new()
        .text("userName", "bobby01")
        .text("fullName", "Bobby")
        .text("email", "bobby01@example.com")
        .text("password", PASSWORD)
        .into_request(Method::POST, "/api/v1/users/register", None);
    let response = app.send(no_avatar).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Avatar is missing in local server !");

    let missing_email = MultipartBody::new()
        .text("userName", "carol01")
        .text("fullName", "Carol")
        .text("email", "   ")
        .text("password", PASSWORD)
        .into_request(Method::POST, "/api/v1/users/register", None);
    let response = app.send(missing_email).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "email is missing !");
}

#[tokio::test]
async fn test_login_sets_cookies_and_rejects_bad_credentials() {
    let app = TestApp::new();
    app.register("alice01").await;

    let response = app.login("alice01").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "User loggedIn successful !");
    assert!(response.data()["accessToken"].is_string());
    assert!(response.data()["refreshToken"].is_string());
    assert_eq!(response.data()["user"]["userName"], "alice01");

    let cookies = response.cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    let by_user_name = app
        .post(
            "/api/v1/users/login",
            None,
            json!({ "userName": "ALICE01", "password": PASSWORD }),
        )
        .await;
    assert_eq!(by_user_name.status, StatusCode::OK);

    let wrong_password = app
        .post(
            "/api/v1/users/login",
            None,
            json!({ "email": "alice01@example.com", "password": "nope" }),
        )
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.message(), "Password is incorrect!");

    let unknown = app
        .post(
            "/api/v1/users/login",
            None,
            json!({ "email": "ghost@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.message(), "User with this email does not exist!");

    let missing = app
        .post("/api/v1/users/login", None, json!({ "email": "alice01@example.com" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Password is missing !");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new();
    let (_, token) = app.signup("alice01").await;

    let anonymous = app.get("/api/v1/users/current-user", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.message(), "Unauthorized request");

    let forged = app.get("/api/v1/users/current-user", Some("not.a.jwt")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.message(), "Invalid access token");

    let bearer = app.get("/api/v1/users/current-user", Some(&token)).await;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(bearer.message(), "current user fetched successfully!");
    assert_eq!(bearer.data()["userName"], "alice01");

    let via_cookie = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/users/current-user")
        .header(header::COOKIE, format!("accessToken={token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(via_cookie).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_rotation() {
    let app = TestApp::new();
    app.register("alice01").await;
    let login = app.login("alice01").await;
    let refresh_token = login.data()["refreshToken"].as_str().unwrap().to_string();

    let missing = app.post("/api/v1/users/refresh-token", None, json!({})).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.message(), "User not authenticated !");

    let garbage = app
        .post("/api/v1/users/refresh-token", None, json!({ "refreshToken": "garbage" }))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.message(), "Invalid refresh Token!");

    let rotated = app
        .post(
            "/api/v1/users/refresh-token",
            None,
            json!({ "refreshToken": refresh_token }),
        )
        .await;
    assert_eq!(rotated.status, StatusCode::OK);
    assert_eq!(rotated.message(), "Access token refreshed!");
    let new_refresh = rotated.data()["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh_token);
    assert_eq!(rotated.cookies().len(), 2);

    let reused = app
        .post(
            "/api/v1/users/refresh-token",
            None,
            json!({ "refreshToken": refresh_token }),
        )
        .await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reused.message(), "Refresh Token expired or used!");

    let via_cookie = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/refresh-token")
        .header(header::COOKIE, format!("refreshToken={new_refresh}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(via_cookie).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::new();
    app.register("alice01").await;
    let login = app.login("alice01").await;
    let access = login.data()["accessToken"].as_str().unwrap().to_string();
    let refresh = login.data()["refreshToken"].as_str().unwrap().to_string();

    let logout = app.post("/api/v1/users/logout", Some(&access), json!({})).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.message(), "User Logged out!");
    assert_eq!(logout.data(), &json!({}));
    assert!(logout.cookies().iter().all(|c| c.contains("Max-Age=0")));

    let refreshed = app
        .post("/api/v1/users/refresh-token", None, json!({ "refreshToken": refresh }))
        .await;
    assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);
    assert_eq!(refreshed.message(), "Refresh Token expired or used!");
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (_, token) = app.signup("alice01").await;

    let same = app
        .post(
            "/api/v1/users/change-password",
            Some(&token),
            json!({ "oldPassword": PASSWORD, "newPassword": PASSWORD }),
        )
        .await;
    assert_eq!(same.status, StatusCode::BAD_REQUEST);
    assert_eq!(same.message(), "Both the passwords can't be same!");

    let missing = app
        .post(
            "/api/v1/users/change-password",
            Some(&token),
            json!({ "oldPassword": PASSWORD }),
        )
        .await;
    assert_eq!(missing.message(), "Both the fields are required!");

    let wrong = app
        .post(
            "/api/v1/users/change-password",
            Some(&token),
            json!({ "oldPassword": "wrong-one", "newPassword": "new-password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.message(), "Invalid old password!");

    let changed = app
        .post(
            "/api/v1/users/change-password",
            Some(&token),
            json!({ "oldPassword": PASSWORD, "newPassword": "new-password" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert_eq!(changed.message(), "Password changed successfully !");

    assert_eq!(app.login("alice01").await.status, StatusCode::UNAUTHORIZED);
    let relogin = app
        .post(
            "/api/v1/users/login",
            None,
            json!({ "email": "alice01@example.com", "password": "new-password" }),
        )
        .await;
    assert_eq!(relogin.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_account() {
    let app = TestApp::new();
    let (_, token) = app.signup("alice01").await;
    app.register("bobby01").await;

    let incomplete = app
        .patch("/api/v1/users/update-account", Some(&token), json!({ "fullName": "A" }))
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert_eq!(incomplete.message(), "All the fields are required!");

    let taken = app
        .patch(
            "/api/v1/users/update-account",
            Some(&token),
            json!({ "fullName": "Alice", "email": "bobby01@example.com" }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let updated = app
        .patch(
            "/api/v1/users/update-account",
            Some(&token),
            json!({ "fullName": "Alice Liddell", "email": "Alice@Wonderland.io" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.message(), "Account Updated successfully!");
    assert_eq!(updated.data()["fullName"], "Alice Liddell");
    assert_eq!(updated.data()["email"], "alice@wonderland.io");
}

#[tokio::test]
async fn test_avatar_and_cover_image_replace_old_assets() {
    let app = TestApp::new();
    let (_, token) = app.signup("alice01").await;
    let old_avatar = app.get("/api/v1/users/current-user", Some(&token)).await.data()["avatar"]
        .as_str()
        .unwrap()
        .to_string();

    let missing = MultipartBody::new().into_request(Method::PATCH, "/api/v1/users/avatar", Some(&token));
    let response = app.send(missing).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Avatar file is missing from local server!");

    let request = MultipartBody::new()
        .file("avatar", "new.jpg", "image/jpeg", b"new-avatar")
        .into_request(Method::PATCH, "/api/v1/users/avatar", Some(&token));
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Avatar updated successfully!");

    let new_avatar = response.data()["avatar"].as_str().unwrap();
    assert_ne!(new_avatar, old_avatar);
    assert!(app.media_exists(new_avatar));
    assert!(!app.media_exists(&old_avatar));

    let request = MultipartBody::new()
        .file("coverImage", "cover.png", "image/png", b"cover")
        .into_request(Method::PATCH, "/api/v1/users/cover-image", Some(&token));
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Cover Image updated successfully!");
    assert!(app.media_exists(response.data()["coverImage"].as_str().unwrap()));
}

#[tokio::test]
async fn test_channel_profile_and_watch_history() {
    let app = TestApp::new();
    let (channel_id, channel_token) = app.signup("creator1").await;
    let (_, viewer_token) = app.signup("viewer1").await;

    let subscribed = app
        .post(
            &format!("/api/v1/subscriptions/c/{channel_id}"),
            Some(&viewer_token),
            json!({}),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED);

    let profile = app.get("/api/v1/users/c/creator1", Some(&viewer_token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.data()["subscribersCount"], 1);
    assert_eq!(profile.data()["channelsSubscribedToCount"], 0);
    assert_eq!(profile.data()["isSubscribed"], true);

    let missing = app.get("/api/v1/users/c/nobody99", Some(&viewer_token)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Channel does not exist!");

    let video_id = app.publish_video(&channel_token, "First upload").await;
    let watched = app
        .get(&format!("/api/v1/videos/{video_id}"), Some(&viewer_token))
        .await;
    assert_eq!(watched.status, StatusCode::OK);

    let history = app.get("/api/v1/users/history", Some(&viewer_token)).await;
    assert_eq!(history.status, StatusCode::OK);
    let videos = history.data().as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["_id"], video_id.as_str());
    assert_eq!(videos[0]["owner"]["userName"], "creator1");
}

#[tokio::test]
async fn test_racing_registrations_leave_only_the_winners_avatar() {
    let app = TestApp::new();

    let (first, second) = tokio::join!(app.register("racer1"), app.register("racer1"));
    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let stored = std::fs::read_dir(app.media_dir.path()).unwrap().count();
    assert_eq!(stored, 1);
}
