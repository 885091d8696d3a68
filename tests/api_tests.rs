use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use sea_orm::EntityTrait;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use wishlist::api::AppState;
use wishlist::config::Config;

const BOUNDARY: &str = "wishlist-test-boundary";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    uploads: PathBuf,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn post_gift(
        &self,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/add_gift")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(multipart_body(fields, image))).unwrap())
            .await
    }

    /// Registers and logs in, returning the session cookie.
    async fn login_as(&self, username: &str, password: &str) -> String {
        let form = format!(
            "username={username}&password={password}&confirm_password={password}"
        );
        let response = self.post_form("/register", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let form = format!("username={username}&password={password}");
        let response = self.post_form("/login", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login should set a session cookie")
    }

    async fn add_gift(&self, cookie: &str, title: &str, price: &str, image: &str) {
        let response = self
            .post_gift(
                &[
                    ("title", title),
                    ("description", "Something nice"),
                    ("link", "https://shop.example/item"),
                    ("price", price),
                ],
                Some((image, b"\x89PNG fake image")),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    async fn catalog(&self) -> serde_json::Value {
        let response = self.get("/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("wishlist-api-test-{id}.db"));
    let uploads = std::env::temp_dir().join(format!("wishlist-api-uploads-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.uploads_path = uploads.display().to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    customize(&mut config);

    let state = wishlist::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: wishlist::api::router(state.clone()),
        state,
        uploads,
    }
}

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let app = spawn_app().await;

    let form = "username=alice&password=secret1&confirm_password=secret1";
    let response = app.post_form("/register", form, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let form = "username=alice&password=other22&confirm_password=other22";
    let response = app.post_form("/register", form, None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["fields"][0]["field"], "username");

    // The first account still logs in with its own password.
    let response = app
        .post_form("/login", "username=alice&password=secret1", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_register_reports_every_bad_field() {
    let app = spawn_app().await;

    let response = app
        .post_form("/register", "username=ab&password=x&confirm_password=y", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"confirm_password"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    app.login_as("alice", "secret1").await;

    let unknown = app
        .post_form("/login", "username=nobody&password=secret1", None)
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown = json_body(unknown).await;

    let wrong = app
        .post_form("/login", "username=alice&password=wrong", None)
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong = json_body(wrong).await;

    assert_eq!(unknown["error"], wrong["error"]);
}

#[tokio::test]
async fn test_add_gift_requires_login() {
    let app = spawn_app().await;

    let response = app
        .post_gift(
            &[
                ("title", "Bike"),
                ("description", "Red"),
                ("link", "https://shop.example/bike"),
                ("price", "100"),
            ],
            Some(("bike.png", b"img")),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadd_gift");

    let catalog = app.catalog().await;
    assert!(catalog["data"]["gifts"].as_array().unwrap().is_empty());
    assert!(!app.uploads.join("bike.png").exists());
}

#[tokio::test]
async fn test_login_honors_local_next_only() {
    let app = spawn_app().await;
    app.login_as("alice", "secret1").await;

    let response = app.get("/my_gifts", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fmy_gifts");

    let response = app
        .post_form(
            "/login",
            "username=alice&password=secret1&next=%2Fmy_gifts",
            None,
        )
        .await;
    assert_eq!(location(&response), "/my_gifts");

    let response = app
        .post_form(
            "/login",
            "username=alice&password=secret1&next=https%3A%2F%2Fevil.example",
            None,
        )
        .await;
    assert_eq!(location(&response), "/add_gift");
}

#[tokio::test]
async fn test_add_gift_and_browse_catalog() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;

    let response = app.get("/add_gift", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.add_gift(&cookie, "Bike", "12,5", "my bike.png").await;

    let stored = app.uploads.join("my_bike.png");
    assert_eq!(std::fs::read(&stored).unwrap(), b"\x89PNG fake image");

    let response = app.get("/", Some(&cookie)).await;
    let body = json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["flashes"][0]["level"], "success");
    assert_eq!(data["current_user"]["username"], "alice");

    let gift = &data["gifts"][0];
    assert_eq!(gift["title"], "Bike");
    assert_eq!(gift["price"], "12.50");
    assert_eq!(gift["image"], "my_bike.png");
    assert_eq!(gift["owner"]["username"], "alice");
    assert_eq!(gift["reservable"], true);

    // Flash messages are shown once.
    let body = json_body(app.get("/", Some(&cookie)).await).await;
    assert!(body["data"]["flashes"].as_array().unwrap().is_empty());

    let response = app.get("/uploads/my_bike.png", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_gift_validation_writes_nothing() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;

    let response = app
        .post_gift(
            &[
                ("title", ""),
                ("description", "Red"),
                ("link", "https://shop.example/bike"),
                ("price", "abc"),
            ],
            Some(("bike.png", b"img")),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["title", "price"]);

    assert!(!app.uploads.join("bike.png").exists());
    assert!(app.catalog().await["data"]["gifts"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_reservation_is_first_come_first_served() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;
    app.add_gift(&cookie, "Teapot", "20", "teapot.png").await;

    let gift_id = app.catalog().await["data"]["gifts"][0]["id"]
        .as_i64()
        .unwrap();
    let gift_uri = format!("/gift/{gift_id}");

    let response = app.get(&gift_uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_form(&gift_uri, "name=Anonymous&comments=", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app
        .post_form(&gift_uri, "name=Bob&comments=mine+now", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let bob = session_cookie(&response).expect("warning flash needs a session");

    let body = json_body(app.get("/", Some(&bob)).await).await;
    assert_eq!(body["data"]["flashes"][0]["level"], "warning");

    let gift = &body["data"]["gifts"][0];
    assert_eq!(gift["reserved_by"], "Anonymous");
    assert!(gift["comments"].is_null());
    assert_eq!(gift["reservable"], false);

    let response = app.get(&gift_uri, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_reservation_requires_name() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;
    app.add_gift(&cookie, "Teapot", "20", "teapot.png").await;

    let response = app.post_form("/gift/1", "name=+&comments=hi", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let gift = &app.catalog().await["data"]["gifts"][0];
    assert!(gift["reserved_by"].is_null());
}

#[tokio::test]
async fn test_unknown_gift_is_not_found() {
    let app = spawn_app().await;

    let response = app.get("/gift/999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post_form("/gift/999", "name=Bob", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for uri in ["/gift/99999999999", "/gift/abc"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
        assert_eq!(json_body(response).await["success"], false);

        let response = app.post_form(uri, "name=Bob", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "POST {uri}");
    }
}

#[tokio::test]
async fn test_session_of_deleted_user_is_anonymous() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;

    let response = app.get("/add_gift", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    wishlist::entities::users::Entity::delete_many()
        .exec(&app.state.store().conn)
        .await
        .unwrap();

    let response = app.get("/add_gift", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadd_gift");

    let body = json_body(app.get("/", Some(&cookie)).await).await;
    assert!(body["data"]["current_user"].is_null());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = spawn_app_with(|config| config.server.max_upload_bytes = 4 * 1024).await;
    let cookie = app.login_as("alice", "secret1").await;

    let image = vec![0_u8; 16 * 1024];
    let response = app
        .post_gift(
            &[
                ("title", "Poster"),
                ("description", "Large print"),
                ("link", "https://shop.example/poster"),
                ("price", "25"),
            ],
            Some(("poster.png", &image)),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    assert!(app.catalog().await["data"]["gifts"]
        .as_array()
        .unwrap()
        .is_empty());
    assert!(!app.uploads.join("poster.png").exists());
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;

    let response = app
        .post_gift(
            &[
                ("title", "Page"),
                ("description", "Not a picture"),
                ("link", "https://shop.example/page"),
                ("price", "1"),
            ],
            Some(("page.html", b"<script>alert(1)</script>")),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(body["fields"][0]["field"], "image");
    assert!(!app.uploads.join("page.html").exists());
}

#[tokio::test]
async fn test_catalog_lists_every_owner() {
    let app = spawn_app().await;

    let alice = app.login_as("alice", "secret1").await;
    app.add_gift(&alice, "Bike", "100", "bike.png").await;
    app.add_gift(&alice, "Book", "15", "book.png").await;

    let bob = app.login_as("bobby", "secret2").await;
    app.add_gift(&bob, "Lamp", "30.99", "lamp.png").await;

    let catalog = app.catalog().await;
    let gifts = catalog["data"]["gifts"].as_array().unwrap();
    let summary: Vec<(&str, &str)> = gifts
        .iter()
        .map(|g| {
            (
                g["title"].as_str().unwrap(),
                g["owner"]["username"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        [("Bike", "alice"), ("Book", "alice"), ("Lamp", "bobby")]
    );

    let body = json_body(app.get("/my_gifts", Some(&bob)).await).await;
    let mine = body["data"]["gifts"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["title"], "Lamp");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = spawn_app().await;
    let cookie = app.login_as("alice", "secret1").await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/add_gift", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login"));
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = spawn_app().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["database"], "ok");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}
