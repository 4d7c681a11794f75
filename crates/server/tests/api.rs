use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bookshelf_core::auth::token::TokenKeys;
use bookshelf_core::database::Db;
use http_body_util::BodyExt as _;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use server::{AppState, router};
use tower::ServiceExt as _;

struct TestApp {
    router: Router,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

struct Session {
    user_id: i64,
    token: String,
}

impl TestApp {
    async fn new() -> Self {
        let state = AppState {
            db: Db::open_in_memory().await.unwrap(),
            keys: TokenKeys::new(b"integration test secret"),
            cookie_secure: false,
            bcrypt_cost: 4,
        };
        Self {
            router: router(state),
        }
    }

    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("token={token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn get(&self, uri: &str, session: &Session) -> Reply {
        self.call(Method::GET, uri, Some(&session.token), None).await
    }

    async fn post(&self, uri: &str, session: &Session, body: Value) -> Reply {
        self.call(Method::POST, uri, Some(&session.token), Some(body)).await
    }

    async fn put(&self, uri: &str, session: &Session, body: Value) -> Reply {
        self.call(Method::PUT, uri, Some(&session.token), Some(body)).await
    }

    async fn delete(&self, uri: &str, session: &Session) -> Reply {
        self.call(Method::DELETE, uri, Some(&session.token), None).await
    }

    async fn register(&self, email: &str) -> i64 {
        let reply = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"email": email, "password": "correct horse", "name": "Reader"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.body["user"]["id"].as_i64().unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> Reply {
        self.call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": email, "password": password})),
        )
        .await
    }

    /// Registers and logs in a fresh user
    async fn session(&self, email: &str) -> Session {
        let user_id = self.register(email).await;
        let reply = self.login(email, "correct horse").await;
        assert_eq!(reply.status, StatusCode::OK);
        let cookie = reply.headers[SET_COOKIE].to_str().unwrap();
        let token = cookie
            .strip_prefix("token=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_owned();
        Session { user_id, token }
    }

    async fn create_book(&self, session: &Session, extra: Value) -> Value {
        let mut body = json!({
            "title": "X",
            "author": "Y",
            "genre": "Z",
            "format": "PHYSICAL",
            "coverImage": "url",
        });
        if let (Some(fields), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            fields.extend(extra.clone());
        }
        let reply = self.post("/books", session, body).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["book"].clone()
    }
}

#[tokio::test]
async fn test_new_user_has_empty_library() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let reply = app.get("/books", &session).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({"Book": []}));
    assert_eq!(
        reply.headers[CACHE_CONTROL],
        "private, max-age=60, stale-while-revalidate=300"
    );
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let app = TestApp::new().await;
    app.register("a@example.com").await;

    let reply = app.login("a@example.com", "correct horse").await;

    let cookie = reply.headers[SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_bad_credentials_get_one_answer() {
    let app = TestApp::new().await;
    app.register("a@example.com").await;

    let wrong_password = app.login("a@example.com", "wrong").await;
    let unknown_user = app.login("nobody@example.com", "correct horse").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert!(!wrong_password.headers.contains_key(SET_COOKIE));
}

#[tokio::test]
async fn test_registration_rules() {
    let app = TestApp::new().await;
    app.register("a@example.com").await;

    let duplicate = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "a@example.com", "password": "other"})),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let missing_password = app
        .call(Method::POST, "/auth/register", None, Some(json!({"email": "b@example.com"})))
        .await;
    assert_eq!(missing_password.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_and_logout() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let me = app.get("/auth/me", &session).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(
        me.body["user"],
        json!({"id": session.user_id, "email": "a@example.com", "name": "Reader"})
    );

    let logout = app.call(Method::POST, "/auth/logout", None, None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.headers[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_credentials_are_required() {
    let app = TestApp::new().await;

    let anonymous = app.call(Method::GET, "/books", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert!(anonymous.body["error"].is_string());

    let forged = app.call(Method::GET, "/account/stats", Some("not.a.token"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let foreign = TokenKeys::new(b"someone else").issue(1).unwrap();
    let foreign = app.call(Method::GET, "/wishlist", Some(&foreign), None).await;
    assert_eq!(foreign.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let request = Request::builder()
        .uri("/auth/me")
        .header(AUTHORIZATION, format!("Bearer {}", session.token))
        .body(Body::empty())
        .unwrap();
    let reply = app.send(request).await;

    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_book_belongs_to_caller() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let book = app.create_book(&session, json!({})).await;

    assert!(book["id"].is_i64());
    assert_eq!(book["userId"], json!(session.user_id));
    assert_eq!(book["status"], "UNREAD");
    assert_eq!(book["coverImage"], "url");
}

#[tokio::test]
async fn test_create_book_reports_missing_fields() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let reply = app.post("/books", &session, json!({"title": "X"})).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = reply.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["coverImage", "author", "genre", "format"]);
}

#[tokio::test]
async fn test_unknown_format_is_rejected() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let reply = app
        .post(
            "/books",
            &session,
            json!({"title": "X", "author": "Y", "genre": "Z", "format": "AUDIO", "coverImage": "url"}),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wishlist_purchase() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let created = app
        .post(
            "/wishlist",
            &session,
            json!({"title": "W", "author": "A", "priority": "MUST_HAVE"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let item_id = created.body["wishlist"]["id"].as_i64().unwrap();

    let bought = app
        .post(&format!("/wishlist/{item_id}/buy"), &session, json!({}))
        .await;
    assert_eq!(bought.status, StatusCode::OK);
    let book_id = bought.body["bookId"].as_i64().unwrap();

    let wishlist = app.get("/wishlist", &session).await;
    assert_eq!(wishlist.body["wishlist"], json!([]));
    assert_eq!(wishlist.body["total"], 0);

    let books = app.get("/books", &session).await;
    let book = &books.body["Book"][0];
    assert_eq!(book["id"], json!(book_id));
    assert_eq!(book["title"], "W");
    assert_eq!(book["author"], "A");
    assert_eq!(book["status"], "UNREAD");
    assert_eq!(book["progress"], 0);

    let again = app
        .post(&format!("/wishlist/{item_id}/buy"), &session, json!({}))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/books", &session).await.body["Book"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wishlist_sorting_is_echoed() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;
    for (title, priority) in [("B", "NICE_TO_HAVE"), ("A", "MUST_HAVE")] {
        app.post(
            "/wishlist",
            &session,
            json!({"title": title, "author": "X", "priority": priority}),
        )
        .await;
    }

    let by_title = app.get("/wishlist?sortBy=title&sortOrder=asc", &session).await;
    assert_eq!(by_title.body["sortBy"], "title");
    assert_eq!(by_title.body["sortOrder"], "asc");
    assert_eq!(by_title.body["wishlist"][0]["title"], "A");

    let fallback = app.get("/wishlist?sortBy=password", &session).await;
    assert_eq!(fallback.body["sortBy"], "createdAt");
    assert_eq!(fallback.body["sortOrder"], "desc");
}

#[tokio::test]
async fn test_wishlist_title_limit() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let reply = app
        .post(
            "/wishlist",
            &session,
            json!({"title": "t".repeat(256), "author": "A", "priority": "WANT_IT"}),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["details"].as_array().unwrap().len(), 1);
    assert_eq!(reply.body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_wishlist_item_of_other_user_is_not_found() {
    let app = TestApp::new().await;
    let owner = app.session("a@example.com").await;
    let intruder = app.session("b@example.com").await;
    let created = app
        .post("/wishlist", &owner, json!({"title": "W", "author": "A", "priority": "WANT_IT"}))
        .await;
    let item_id = created.body["wishlist"]["id"].as_i64().unwrap();
    let uri = format!("/wishlist/{item_id}");

    assert_eq!(
        app.put(&uri, &intruder, json!({"note": "mine"})).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&uri, &intruder).await.status, StatusCode::NOT_FOUND);

    let updated = app.put(&uri, &owner, json!({"note": "  gift  "})).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["item"]["note"], "gift");

    let deleted = app.delete(&uri, &owner).await;
    assert_eq!(deleted.body["item"]["id"], json!(item_id));
}

#[tokio::test]
async fn test_foreign_update_is_forbidden() {
    let app = TestApp::new().await;
    let owner = app.session("a@example.com").await;
    let intruder = app.session("b@example.com").await;
    let book = app.create_book(&owner, json!({})).await;
    let uri = format!("/books/{}", book["id"]);

    let reply = app.put(&uri, &intruder, json!({"title": "Stolen"})).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&uri, &intruder).await.status, StatusCode::FORBIDDEN);

    let unchanged = app.get(&uri, &owner).await;
    assert_eq!(unchanged.body["book"]["title"], "X");
    assert_eq!(unchanged.body["book"]["quotes"], json!([]));
}

#[tokio::test]
async fn test_book_patch_rules() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;
    let book = app
        .create_book(&session, json!({"publisher": "Chilton", "pageCount": 412}))
        .await;
    let uri = format!("/books/{}", book["id"]);

    let empty = app.put(&uri, &session, json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let mass_assignment = app.put(&uri, &session, json!({"userId": 999})).await;
    assert_eq!(mass_assignment.status, StatusCode::BAD_REQUEST);

    let updated = app
        .put(&uri, &session, json!({"status": "READING", "progress": 40, "publisher": null}))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["book"]["status"], "READING");
    assert_eq!(updated.body["book"]["progress"], 40);
    assert_eq!(updated.body["book"]["publisher"], Value::Null);
    assert_eq!(updated.body["book"]["pageCount"], 412);
}

#[tokio::test]
async fn test_missing_book() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    assert_eq!(app.get("/books/404", &session).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/books/abc", &session).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;
    app.create_book(&session, json!({"title": "Dune"})).await;
    app.create_book(&session, json!({"title": "Emma", "author": "Austen"})).await;

    let found = app.get("/books/search?q=dUnE", &session).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["total"], 1);
    assert_eq!(found.body["books"][0]["title"], "Dune");
    assert_eq!(found.body["totalPages"], 1);

    let blank = app.get("/books/search?q=%20%20", &session).await;
    assert_eq!(blank.status, StatusCode::OK);
    assert_eq!(blank.body["total"], 0);
    assert_eq!(blank.body["books"], json!([]));
}

#[tokio::test]
async fn test_quotes_follow_book_ownership() {
    let app = TestApp::new().await;
    let owner = app.session("a@example.com").await;
    let intruder = app.session("b@example.com").await;
    let book = app.create_book(&owner, json!({})).await;

    let denied = app
        .post("/quotes", &intruder, json!({"content": "hi", "bookId": book["id"]}))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let created = app
        .post("/quotes", &owner, json!({"content": "hi", "page": 3, "bookId": book["id"]}))
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let uri = format!("/quotes/{}", created.body["quote"]["id"]);

    assert_eq!(
        app.put(&uri, &intruder, json!({"content": "bye"})).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.delete(&uri, &intruder).await.status, StatusCode::FORBIDDEN);

    let public = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.body["quote"]["content"], "hi");

    assert_eq!(app.delete(&uri, &owner).await.status, StatusCode::OK);
    assert_eq!(app.call(Method::GET, &uri, None, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statistics() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;
    app.create_book(&session, json!({"status": "FINISHED", "rating": 8})).await;
    app.create_book(&session, json!({"status": "FINISHED", "rating": 10})).await;
    app.create_book(&session, json!({})).await;

    let reply = app.get("/account/stats", &session).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["overview"]["finishedBooks"], 2);
    assert_eq!(reply.body["overview"]["avgRating"], 9.0);
    let by_status = reply.body["breakdowns"]["byStatus"].as_array().unwrap();
    assert!(by_status.contains(&json!({"name": "تمام شده", "count": 2})));
    assert!(by_status.contains(&json!({"name": "خوانده نشده", "count": 1})));
    assert_eq!(reply.body["trends"]["monthly"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_statistics_for_empty_library() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;

    let overview = app.get("/account/stats", &session).await.body["overview"].clone();

    for field in [
        "totalBooks",
        "totalPages",
        "totalPagesRead",
        "finishedBooks",
        "readingBooks",
        "unreadBooks",
        "totalWishlist",
        "avgProgress",
    ] {
        assert_eq!(overview[field], 0, "{field}");
    }
    assert_eq!(overview["avgRating"], 0.0);
}

#[tokio::test]
async fn test_search_page_beyond_range() {
    let app = TestApp::new().await;
    let session = app.session("a@example.com").await;
    app.create_book(&session, json!({"title": "Dune"})).await;

    let reply = app
        .get("/books/search?q=dune&page=9223372036854775807&limit=100", &session)
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["total"], 1);
    assert_eq!(reply.body["books"], json!([]));
}
