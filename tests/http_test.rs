//! End-to-end HTTP tests against the in-memory store: the JSON API, public
//! pages, accounts, the request wizard and the admin screens.

mod common;

use std::sync::{Arc, LazyLock};

use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::test::{self, TestRequest};
use actix_web::App;
use regex::Regex;
use serde_json::{Value, json};

use homeserve::app::session_middleware;
use homeserve::auth::password;
use homeserve::dispatch::{DEGRADED_MESSAGE, DisabledSender, EmailSender, RECEIVED_MESSAGE};
use homeserve::fixtures;
use homeserve::store::{CatalogStore, MemoryStore, UserStore};
use common::*;

static CSRF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="csrf_token" value="([0-9a-f]+)""#).expect("regex"));

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password";

macro_rules! test_app {
    ($state:expr) => {{
        let state = $state;
        test::init_service(
            App::new()
                .wrap(session_middleware(Key::generate()))
                .configure(move |cfg| state.configure(cfg)),
        )
        .await
    }};
}

/// Seeded state; returns the store and the id of the named category.
async fn seeded(sender: Arc<dyn EmailSender>, category: &str) -> (homeserve::app::AppState, Arc<MemoryStore>, i64) {
    let (state, store) = memory_app_state(sender);
    fixtures::seed(store.as_ref()).await.expect("seed");
    let id = category_id(&store, category).await;
    (state, store, id)
}

async fn category_id(store: &MemoryStore, name: &str) -> i64 {
    store
        .list_categories()
        .await
        .expect("list")
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .expect("category exists")
}

/// Keeps the session cookie of the latest response.
#[derive(Default, Clone)]
struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    fn get(&self, uri: &str) -> TestRequest {
        self.with_cookie(TestRequest::get().uri(uri))
    }

    fn post(&self, uri: &str, form: &[(&str, &str)]) -> TestRequest {
        let body = serde_urlencoded::to_string(form).expect("form body");
        self.with_cookie(
            TestRequest::post()
                .uri(uri)
                .insert_header(ContentType::form_url_encoded())
                .set_payload(body),
        )
    }

    fn with_cookie(&self, req: TestRequest) -> TestRequest {
        match &self.cookie {
            Some(c) => req.cookie(c.clone()),
            None => req,
        }
    }

    fn remember<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(c) = resp.response().cookies().find(|c| c.name() == "id") {
            self.cookie = Some(c.into_owned());
        }
    }
}

fn csrf_token(body: &[u8]) -> String {
    let html = std::str::from_utf8(body).expect("utf8");
    CSRF_RE.captures(html).expect("csrf token in page")[1].to_string()
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_api_lists_categories() {
    let (state, _, _) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);

    let req = TestRequest::get().uri("/api/categories").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["categories"].as_array().expect("array").len(), 5);
}

#[actix_rt::test]
async fn test_api_returns_flow() {
    let (state, _, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);

    let req = TestRequest::get().uri(&format!("/api/categories/{painting}/flow")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["initialStepId"], "step-1");
    assert_eq!(body["steps"].as_array().expect("steps").len(), 9);
    assert_eq!(body["steps"][2]["conditionalNextStep"][0]["optionId"], "opt-9");

    let missing = TestRequest::get().uri("/api/categories/9999/flow").to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_api_next_follows_branch() {
    let (state, _, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);
    let uri = format!("/api/categories/{painting}/flow/next");

    let req = TestRequest::post()
        .uri(&uri)
        .set_json(json!({
            "currentStepId": "step-3",
            "answers": { "step-3": { "kind": "choice", "optionId": "opt-9" } }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["next"]["stepId"], "step-4");
    assert_eq!(body["progress"], 44);
    assert_eq!(body["valid"], true);

    let req = TestRequest::post()
        .uri(&uri)
        .set_json(json!({
            "currentStepId": "step-3",
            "answers": { "step-3": { "kind": "choice", "optionId": "opt-10" } }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["next"]["stepId"], "step-5");
}

#[actix_rt::test]
async fn test_api_next_on_terminal_step() {
    let (state, _, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);
    let uri = format!("/api/categories/{painting}/flow/next");

    let req = TestRequest::post()
        .uri(&uri)
        .set_json(json!({ "currentStepId": "step-9" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["next"], "submit");
    assert_eq!(body["progress"], 100);
    assert_eq!(body["valid"], false);

    let req = TestRequest::post()
        .uri(&uri)
        .set_json(json!({
            "currentStepId": "step-9",
            "contact": { "fullName": CONTACT_NAME, "email": CONTACT_EMAIL, "phone": CONTACT_PHONE }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["valid"], true);
}

#[actix_rt::test]
async fn test_api_next_errors() {
    let (state, _, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);
    let uri = format!("/api/categories/{painting}/flow/next");

    let unknown = TestRequest::post()
        .uri(&uri)
        .set_json(json!({ "currentStepId": "step-99" }))
        .to_request();
    let resp = test::call_service(&app, unknown).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let not_json = TestRequest::post()
        .uri(&uri)
        .insert_header(("content-type", "text/plain"))
        .set_payload("currentStepId=step-1")
        .to_request();
    let resp = test::call_service(&app, not_json).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Public pages
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_home_and_category_pages() {
    let (state, _, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);

    let home = test::call_and_read_body(&app, TestRequest::get().uri("/").to_request()).await;
    let home = String::from_utf8(home.to_vec()).expect("utf8");
    assert!(home.contains("Painting"));
    assert!(home.contains("Popular services"));

    let req = TestRequest::get()
        .uri(&format!("/categories/{painting}?sort=price-high&min_price=100"))
        .to_request();
    let page = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).expect("utf8");
    assert!(page.contains(&format!("/request/{painting}")));
    let facade = page.find("Facade painting").expect("facade listed");
    let room = page.find("Room painting").expect("room listed");
    assert!(facade < room, "expensive service first");
}

#[actix_rt::test]
async fn test_unknown_pages_are_404() {
    let (state, _, _) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);

    for uri in ["/categories/9999", "/request/9999", "/no/such/page"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_category_without_flow_has_no_wizard() {
    let (state, _, plumbing) = seeded(Arc::new(DisabledSender), "Plumbing").await;
    let app = test_app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri(&format!("/request/{plumbing}")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Request wizard
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_replayed_contact_cookie_does_not_send_twice() {
    let sender = Arc::new(RecordingSender::default());
    let (state, _, cleaning) = seeded(sender.clone(), "Cleaning").await;
    let app = test_app!(state);
    let base = format!("/request/{cleaning}");
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);
    for answer in ["opt-2", "10:30", "1 Main St"] {
        let req = browser.post(&format!("{base}/answer"), &[("csrf_token", token.as_str()), ("answer", answer)]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "answer {answer}");
        browser.remember(&resp);
    }

    let contact = [
        ("csrf_token", token.as_str()),
        ("full_name", CONTACT_NAME),
        ("email", CONTACT_EMAIL),
        ("phone", CONTACT_PHONE),
    ];
    let stale = browser.clone();
    let resp = test::call_service(&app, browser.post(&format!("{base}/contact"), &contact).to_request()).await;
    assert_eq!(location(&resp), "/request/success");
    assert_eq!(sender.count(), 1);

    let replay = test::call_service(&app, stale.post(&format!("{base}/contact"), &contact).to_request()).await;
    assert_eq!(replay.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&replay), format!("/categories/{cleaning}"));
    assert_eq!(sender.count(), 1);
}

async fn run_cleaning_request(sender: Arc<dyn EmailSender>) -> String {
    let (state, _, cleaning) = seeded(sender, "Cleaning").await;
    let app = test_app!(state);
    let base = format!("/request/{cleaning}");
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);

    for answer in ["opt-2", "10:30", "1 Main St"] {
        let req = browser.post(&format!("{base}/answer"), &[("csrf_token", token.as_str()), ("answer", answer)]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "answer {answer}");
        assert_eq!(location(&resp), base);
        browser.remember(&resp);
    }

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("Contact details"));
    assert!(page.contains(&format!("{base}/contact")));

    let contact = [
        ("csrf_token", token.as_str()),
        ("full_name", CONTACT_NAME),
        ("email", CONTACT_EMAIL),
        ("phone", CONTACT_PHONE),
    ];
    let resp = test::call_service(&app, browser.post(&format!("{base}/contact"), &contact).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/request/success");
    browser.remember(&resp);

    let resp = test::call_service(&app, browser.get("/request/success").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    browser.remember(&resp);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");

    // The outcome is shown once.
    let again = test::call_service(&app, browser.get("/request/success").to_request()).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);

    page
}

#[actix_rt::test]
async fn test_wizard_submits_request() {
    let sender = Arc::new(RecordingSender::default());
    let page = run_cleaning_request(sender.clone()).await;

    assert!(page.contains(RECEIVED_MESSAGE));
    assert!(page.contains("https://wa.me/15550100"));
    assert!(page.contains(r#"http-equiv="refresh" content="10;url=/""#));

    let sent = sender.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].message.contains("What kind of place needs cleaning?: House"));
    assert!(sent[0].message.contains("Address: 1 Main St"));
}

#[actix_rt::test]
async fn test_wizard_degrades_without_email() {
    let page = run_cleaning_request(Arc::new(DisabledSender)).await;
    assert!(page.contains(DEGRADED_MESSAGE));
    assert!(page.contains("https://wa.me/15550100"));
}

#[actix_rt::test]
async fn test_wizard_rejects_invalid_contact() {
    let sender = Arc::new(RecordingSender::default());
    let (state, _, cleaning) = seeded(sender.clone(), "Cleaning").await;
    let app = test_app!(state);
    let base = format!("/request/{cleaning}");
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);
    for answer in ["opt-1", "08:00", "2 High St"] {
        let req = browser.post(&format!("{base}/answer"), &[("csrf_token", token.as_str()), ("answer", answer)]);
        let resp = test::call_service(&app, req.to_request()).await;
        browser.remember(&resp);
    }

    let contact = [
        ("csrf_token", token.as_str()),
        ("full_name", CONTACT_NAME),
        ("email", "not-an-email"),
        ("phone", CONTACT_PHONE),
    ];
    let resp = test::call_service(&app, browser.post(&format!("{base}/contact"), &contact).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("Enter a valid email address"));
    assert_eq!(sender.count(), 0);
}

#[actix_rt::test]
async fn test_wizard_requires_answer_and_csrf() {
    let (state, _, cleaning) = seeded(Arc::new(DisabledSender), "Cleaning").await;
    let app = test_app!(state);
    let base = format!("/request/{cleaning}");
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);

    let req = browser.post(&format!("{base}/answer"), &[("csrf_token", token.as_str()), ("answer", "")]);
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("Please answer this question to continue."));

    let req = browser.post(&format!("{base}/answer"), &[("csrf_token", "forged"), ("answer", "opt-1")]);
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_wizard_back_and_cancel() {
    let (state, _, cleaning) = seeded(Arc::new(DisabledSender), "Cleaning").await;
    let app = test_app!(state);
    let base = format!("/request/{cleaning}");
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);

    let req = browser.post(&format!("{base}/answer"), &[("csrf_token", token.as_str()), ("answer", "opt-3")]);
    let resp = test::call_service(&app, req.to_request()).await;
    browser.remember(&resp);

    let resp = test::call_service(&app, browser.post(&format!("{base}/back"), &[("csrf_token", token.as_str())]).to_request()).await;
    browser.remember(&resp);
    let resp = test::call_service(&app, browser.get(&base).to_request()).await;
    browser.remember(&resp);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("What kind of place needs cleaning?"));
    // The earlier answer is still selected.
    assert!(page.contains(r#"value="opt-3" checked"#));

    let resp = test::call_service(&app, browser.post(&format!("{base}/cancel"), &[("csrf_token", token.as_str())]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/categories/{cleaning}"));
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[actix_rt::test]
async fn test_admin_requires_sign_in() {
    let (state, _, _) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[actix_rt::test]
async fn test_admin_edits_flow_and_previews() {
    let (state, store, painting) = seeded(Arc::new(DisabledSender), "Painting").await;
    let hash = password::hash_password(ADMIN_PASSWORD).expect("hash");
    store.upsert_admin("Admin", ADMIN_EMAIL, &hash).await.expect("admin");
    let app = test_app!(state);
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get("/login").to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);

    let login = [("csrf_token", token.as_str()), ("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)];
    let resp = test::call_service(&app, browser.post("/login", &login).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");
    browser.remember(&resp);

    let resp = test::call_service(&app, browser.get("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    browser.remember(&resp);

    let uri = format!("/admin/categories/{painting}/steps/step-5/options");
    let resp = test::call_service(&app, browser.post(&uri, &[("csrf_token", token.as_str()), ("label", "Only some rooms")]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    browser.remember(&resp);

    let flow = store.find_flow(painting).await.expect("find").expect("flow");
    let step = flow.step("step-5").expect("step-5");
    assert_eq!(step.options.len(), 3);
    assert_eq!(step.options[2].label, "Only some rooms");

    let resp = test::call_service(&app, browser.get(&format!("/admin/categories/{painting}/preview")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("Preview mode"));
    assert!(page.contains(&format!("/admin/categories/{painting}/preview/answer")));
}

#[actix_rt::test]
async fn test_register_sign_out_and_duplicate_email() {
    let (state, store, _) = seeded(Arc::new(DisabledSender), "Painting").await;
    let app = test_app!(state);
    let mut browser = Browser::default();

    let resp = test::call_service(&app, browser.get("/register").to_request()).await;
    browser.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);

    let form = [
        ("csrf_token", token.as_str()),
        ("name", "Sam Lee"),
        ("email", "Sam@Example.com"),
        ("phone", ""),
        ("password", "long-enough"),
        ("password_confirm", "long-enough"),
    ];
    let resp = test::call_service(&app, browser.post("/register", &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    browser.remember(&resp);

    let user = store.find_user_by_email("sam@example.com").await.expect("find").expect("registered");
    assert_eq!(user.role, homeserve::models::user::Role::User);
    assert_eq!(user.phone, None);

    let resp = test::call_service(&app, browser.get("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, browser.post("/logout", &[("csrf_token", token.as_str())]).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    browser.remember(&resp);

    let resp = test::call_service(&app, browser.get("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let mut other = Browser::default();
    let resp = test::call_service(&app, other.get("/register").to_request()).await;
    other.remember(&resp);
    let token = csrf_token(&test::read_body(resp).await);
    let form = [
        ("csrf_token", token.as_str()),
        ("name", "Sam Again"),
        ("email", "sam@example.com"),
        ("phone", "+1 555 0199"),
        ("password", "long-enough"),
        ("password_confirm", "long-enough"),
    ];
    let resp = test::call_service(&app, other.post("/register", &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = String::from_utf8(test::read_body(resp).await.to_vec()).expect("utf8");
    assert!(page.contains("already registered"));
}
