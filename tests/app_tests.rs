//! Routing, hooks and dispatch behavior through the in-process client.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dyne::{App, Request, Response, Settings, StatusCode};

#[tokio::test]
async fn test_hello_world() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("hello, world!");
        Ok(resp)
    });

    let client = app.client();
    let resp = client.get("/").send().await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.header("content-type"), Some("text/plain"));
    assert_eq!(resp.text(), "hello, world!");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let resp = app.client().get("/missing").send().await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.text(), "404 Not Found");
}

#[tokio::test]
async fn test_wrong_method_is_405_with_allow() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let resp = app.client().delete("/").send().await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.header("allow"), Some("GET, HEAD, OPTIONS"));
    assert_eq!(resp.text(), "405 Method Not Allowed");
}

#[tokio::test]
async fn test_options_answers_from_method_table() {
    let mut app = common::app();
    app.at("/things")
        .post(|req: Request, mut resp: Response| async move {
            resp.set_status(StatusCode::CREATED);
            resp.text(req.text());
            Ok(resp)
        });

    let resp = app.client().options("/things").send().await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.header("allow"), Some("OPTIONS, POST"));
}

#[tokio::test]
async fn test_handler_error_is_500() {
    let mut app = common::app();
    app.at("/boom")
        .get(|_req: Request, mut resp: Response| async move {
            let data = tokio::fs::read("/definitely/not/here").await?;
            resp.content(data, "application/octet-stream");
            Ok(resp)
        });

    let resp = app.client().get("/boom").send().await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text(), "500 Internal Server Error");
}

#[tokio::test]
async fn test_raised_status_becomes_json_error() {
    let mut app = common::app();
    app.at("/reject")
        .get(|_req: Request, _resp: Response| async move {
            Err(dyne::Error::bad_request("name required"))
        });

    let resp = app.client().get("/reject").send().await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"], "name required");
}

#[tokio::test]
async fn test_path_params() {
    let mut app = common::app();
    app.at("/orders/{id}")
        .get(|req: Request, mut resp: Response| async move {
            let id = req.param("id").unwrap_or("?").to_string();
            resp.text(format!("order {id}"));
            Ok(resp)
        });

    let resp = app.client().get("/orders/42").send().await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text(), "order 42");
}

#[tokio::test]
async fn test_repeated_query_key_keeps_last() {
    let mut app = common::app();
    app.at("/search")
        .get(|req: Request, mut resp: Response| async move {
            resp.text(req.query("q").unwrap_or_default());
            Ok(resp)
        });

    let resp = app.client().get("/search?q=first&q=last").send().await;

    assert_eq!(resp.text(), "last");
}

#[tokio::test]
async fn test_catch_all_runs_before_method_endpoint() {
    let mut app = common::app();
    app.at("/traced")
        .all(|_req: Request, mut resp: Response| async move {
            resp.set_header("x-traced", "yes");
            Ok(resp)
        })
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("traced get");
            Ok(resp)
        });

    let client = app.client();

    let resp = client.get("/traced").send().await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.header("x-traced"), Some("yes"));
    assert_eq!(resp.text(), "traced get");

    // No POST endpoint, but the catch-all still answers.
    let resp = client.post("/traced").send().await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.header("x-traced"), Some("yes"));
}

#[tokio::test]
async fn test_before_hooks_run_in_order() {
    let mut app = common::app();
    app.before(|_req: Request, mut resp: Response| async move {
        resp.set_header("x-hook", "first");
        Ok(resp)
    });
    app.before(|_req: Request, mut resp: Response| async move {
        let prev = resp
            .headers()
            .get("x-hook")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        resp.set_header("x-hook", &format!("{prev},second"));
        Ok(resp)
    });
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let resp = app.client().get("/").send().await;

    assert_eq!(resp.header("x-hook"), Some("first,second"));
    assert_eq!(resp.text(), "home");
}

#[tokio::test]
async fn test_failed_hook_skips_handler() {
    let mut app = common::app();
    app.before(|_req: Request, _resp: Response| async move {
        Err(dyne::Error::status_with_message(
            StatusCode::UNAUTHORIZED,
            "token missing",
        ))
    });
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let resp = app.client().get("/").send().await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"], "token missing");
}

#[tokio::test]
async fn test_startup_runs_once_before_first_request() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);

    let mut app = common::app();
    app.on_startup(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let client = app.client();
    client.get("/").send().await;
    client.get("/").send().await;

    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redirect_defaults_to_moved_permanently() {
    let mut app = common::app();
    app.at("/old")
        .get(|_req: Request, mut resp: Response| async move {
            resp.redirect("/new");
            Ok(resp)
        });

    let resp = app.client().get("/old").send().await;

    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.header("location"), Some("/new"));
}

#[tokio::test]
async fn test_set_and_read_cookies() {
    let mut app = common::app();
    app.at("/login")
        .post(|_req: Request, mut resp: Response| async move {
            resp.set_cookie(
                dyne::Cookie::new("session", "abc123")
                    .path("/")
                    .http_only(true),
            );
            resp.text("ok");
            Ok(resp)
        });
    app.at("/whoami")
        .get(|req: Request, mut resp: Response| async move {
            let session = req.cookies().get("session").cloned().unwrap_or_default();
            resp.text(session);
            Ok(resp)
        });

    let client = app.client();

    let resp = client.post("/login").send().await;
    let cookies = resp.set_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0], "session=abc123; Path=/; HttpOnly");

    let resp = client
        .get("/whoami")
        .header("cookie", "session=abc123; theme=dark")
        .send()
        .await;
    assert_eq!(resp.text(), "abc123");
}

#[tokio::test]
async fn test_allowed_hosts() {
    let mut settings = Settings::default();
    settings.logging.access_log = false;
    settings.allowed_hosts = vec!["testserver".to_string(), "*.example.com".to_string()];

    let mut app = App::with_settings(settings);
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("home");
        Ok(resp)
    });

    let client = app.client();

    // The client's default Host is testserver.
    let resp = client.get("/").send().await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get("/")
        .header("host", "api.example.com")
        .send()
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get("/").header("host", "evil.com").send().await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text(), "Invalid host header");
}

#[tokio::test]
async fn test_url_for_reverses_named_routes() {
    let mut app = common::app();
    app.at("/orders/{id}")
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("order");
            Ok(resp)
        })
        .name("order-detail");

    let client = app.client();

    assert_eq!(
        client.url_for("order-detail", &[("id", "9")]).unwrap(),
        "/orders/9"
    );
    assert!(client.url_for("nope", &[]).is_none());
}

#[tokio::test]
async fn test_head_reuses_get_without_body() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.text("hello, world!");
        Ok(resp)
    });

    let resp = app.client().head("/").send().await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.header("content-length"), Some("13"));
    assert!(resp.body().is_empty());
}

#[tokio::test]
async fn test_custom_status_and_request_body() {
    let mut app = common::app();
    app.at("/things")
        .post(|req: Request, mut resp: Response| async move {
            resp.set_status(StatusCode::CREATED);
            resp.text(req.text());
            Ok(resp)
        });

    let resp = app.client().post("/things").body("widget").send().await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.text(), "widget");
}

#[tokio::test]
async fn test_routes_match_in_registration_order() {
    let mut app = common::app();
    app.at("/orders/{id}")
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("by id");
            Ok(resp)
        });
    app.at("/orders/latest")
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("latest");
            Ok(resp)
        });

    // The parameterized route was registered first, so it wins.
    let resp = app.client().get("/orders/latest").send().await;
    assert_eq!(resp.text(), "by id");
}

#[tokio::test]
async fn test_trailing_slash_routes_are_distinct() {
    let mut app = common::app();
    app.at("/orders")
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("no slash");
            Ok(resp)
        });

    let client = app.client();
    assert_eq!(client.get("/orders").send().await.text(), "no slash");
    assert_eq!(
        client.get("/orders/").send().await.status(),
        StatusCode::NOT_FOUND
    );
}
