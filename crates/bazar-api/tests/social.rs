mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::app;

#[tokio::test]
async fn messages_between_two_users() {
    let app = app();
    let (ana, ana_id) = app.register("ana@example.com", "buyer").await;
    let (luis, luis_id) = app.register("luis@example.com", "seller").await;
    let (olga, _) = app.register("olga@example.com", "buyer").await;

    let (status, _) = app
        .post(
            "/messages",
            Some(&ana),
            json!({ "user_sender": luis_id, "user_receiver": ana_id, "content": "hola" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/messages", Some(&ana), json!({ "user_receiver": luis_id, "content": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/messages", Some(&ana), json!({ "user_receiver": 9999, "content": "hola" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post(
            "/messages",
            Some(&ana),
            json!({ "user_receiver": luis_id.to_string(), "content": "¿Sigue disponible?" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["results"]["id"].as_i64().unwrap();
    assert_eq!(body["results"]["user_sender"].as_i64(), Some(ana_id));
    assert!(body["results"]["review_date"].is_null());

    let (_, body) = app.get("/messages", Some(&luis)).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    let (_, body) = app.get("/messages", Some(&olga)).await;
    assert_eq!(body["results"], json!([]));

    let read_uri = format!("/messages/{}/read", message_id);
    let (status, _) = app.put(&read_uri, Some(&ana), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.put(&read_uri, Some(&luis), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let first_read = body["results"]["review_date"].clone();
    assert!(first_read.is_string());

    let (_, body) = app.put(&read_uri, Some(&luis), json!({})).await;
    assert_eq!(body["results"]["review_date"], first_read);

    let uri = format!("/messages/{}", message_id);
    let (status, _) = app.delete(&uri, Some(&olga)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&luis)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&uri, Some(&ana)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cannot_message_yourself() {
    let app = app();
    let (ana, ana_id) = app.register("ana@example.com", "buyer").await;

    let (status, _) = app
        .post("/messages", Some(&ana), json!({ "user_receiver": ana_id, "content": "eco" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_on_profiles_and_products() {
    let app = app();
    let (ana, ana_id) = app.register("ana@example.com", "buyer").await;
    let (sara, sara_id) = app.register("sara@example.com", "seller").await;
    let (olga, _) = app.register("olga@example.com", "buyer").await;
    let bike = app.product(&sara, "Bike", 100.0).await;

    let (status, _) = app
        .post("/comments", Some(&ana), json!({ "profile_user_id": ana_id, "content": "soy genial" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/comments",
            Some(&ana),
            json!({ "profile_user_id": sara_id, "product_id": bike, "content": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/comments", Some(&ana), json!({ "product_id": 9999, "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/comments", Some(&ana), json!({ "profile_user_id": sara_id, "content": "Vendedora de fiar" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["results"]["author_name"], "Nombre Apellido");
    let profile_comment = body["results"]["id"].as_i64().unwrap();

    let (status, body) = app
        .post("/comments", Some(&olga), json!({ "product_id": bike.to_string(), "content": "¿Talla?" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_comment = body["results"]["id"].as_i64().unwrap();

    let (_, body) = app.get(&format!("/comments/profile/{}", sara_id), None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    let (_, body) = app.get(&format!("/comments/product/{}", bike), None).await;
    assert_eq!(body["results"][0]["id"].as_i64(), Some(product_comment));
    let (_, body) = app.get("/comments", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (status, _) = app.get("/comments/product/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The profile owner may remove comments left on their profile.
    let (status, _) = app.delete(&format!("/comments/{}", profile_comment), Some(&olga)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/comments/{}", profile_comment), Some(&sara)).await;
    assert_eq!(status, StatusCode::OK);

    // Removing the product takes its comments with it.
    app.delete(&format!("/products/{}", bike), Some(&sara)).await;
    let (_, body) = app.get("/comments", None).await;
    assert_eq!(body["results"], json!([]));
}
