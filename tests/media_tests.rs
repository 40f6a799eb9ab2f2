//! Content negotiation and request body decoding.

mod common;

use dyne::{Request, Response, StatusCode};

fn echo_app() -> dyne::App {
    let mut app = common::app();
    app.at("/echo")
        .post(|req: Request, mut resp: Response| async move {
            let value = req.media_value()?;
            resp.media(&value)?;
            Ok(resp)
        });
    app
}

#[tokio::test]
async fn test_media_defaults_to_json() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.media(&serde_json::json!({"hello": "sam"}))?;
        Ok(resp)
    });

    let resp = app.client().get("/").send().await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert_eq!(resp.text(), r#"{"hello":"sam"}"#);
}

#[tokio::test]
async fn test_accept_yaml_negotiates_yaml() {
    let mut app = common::app();
    app.at("/").get(|_req: Request, mut resp: Response| async move {
        resp.media(&serde_json::json!({"hello": "sam"}))?;
        Ok(resp)
    });

    let resp = app
        .client()
        .get("/")
        .header("accept", "application/x-yaml")
        .send()
        .await;

    assert_eq!(resp.header("content-type"), Some("application/x-yaml"));
    assert_eq!(resp.text(), "hello: sam\n");
}

#[tokio::test]
async fn test_text_and_html_content_types_are_exact() {
    let mut app = common::app();
    app.at("/plain")
        .get(|_req: Request, mut resp: Response| async move {
            resp.text("x");
            Ok(resp)
        });
    app.at("/page")
        .get(|_req: Request, mut resp: Response| async move {
            resp.html("<h1>x</h1>");
            Ok(resp)
        });

    let client = app.client();

    let resp = client.get("/plain").send().await;
    assert_eq!(resp.header("content-type"), Some("text/plain"));

    let resp = client.get("/page").send().await;
    assert_eq!(resp.header("content-type"), Some("text/html"));
}

#[tokio::test]
async fn test_json_request_body() {
    let resp = echo_app()
        .client()
        .post("/echo")
        .json(&serde_json::json!({"hello": "sam"}))
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text(), r#"{"hello":"sam"}"#);
}

#[tokio::test]
async fn test_yaml_request_body() {
    let resp = echo_app()
        .client()
        .post("/echo")
        .header("content-type", "application/x-yaml")
        .body("hello: sam\n")
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text(), r#"{"hello":"sam"}"#);
}

#[tokio::test]
async fn test_form_request_body() {
    let resp = echo_app()
        .client()
        .post("/echo")
        .form(&[("a", "1"), ("b", "two words")])
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["a"], "1");
    assert_eq!(body["b"], "two words");
}

#[tokio::test]
async fn test_repeated_form_key_keeps_last() {
    let mut app = common::app();
    app.at("/form")
        .post(|req: Request, mut resp: Response| async move {
            let fields = req.form();
            resp.text(fields.get("q").cloned().unwrap_or_default());
            Ok(resp)
        });

    let resp = app
        .client()
        .post("/form")
        .form(&[("q", "first"), ("q", "last")])
        .send()
        .await;

    assert_eq!(resp.text(), "last");
}

#[tokio::test]
async fn test_unknown_content_type_is_415() {
    let resp = echo_app()
        .client()
        .post("/echo")
        .header("content-type", "text/csv")
        .body("a,b\n1,2\n")
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: serde_json::Value = resp.json();
    assert!(body["error"].as_str().unwrap().contains("text/csv"));
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let resp = echo_app().client().post("/echo").body("{}").send().await;

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let resp = echo_app()
        .client()
        .post("/echo")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_multipart_upload() {
    let mut app = common::app();
    app.at("/upload")
        .post(|req: Request, mut resp: Response| async move {
            let parts = req.multipart()?;
            let summary: Vec<String> = parts
                .iter()
                .map(|part| {
                    if part.is_file() {
                        format!("{}:{}", part.name, part.filename.clone().unwrap_or_default())
                    } else {
                        format!("{}={}", part.name, part.text())
                    }
                })
                .collect();
            resp.text(summary.join(","));
            Ok(resp)
        });

    let boundary = "----dyneboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         hello\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         file-data\r\n\
         --{boundary}--\r\n"
    );

    let resp = app
        .client()
        .post("/upload")
        .header(
            "content-type",
            &format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text(), "note=hello,file:a.txt");
}

#[tokio::test]
async fn test_multipart_media_value() {
    let mut app = common::app();
    app.at("/upload")
        .post(|req: Request, mut resp: Response| async move {
            let value = req.media_value()?;
            resp.media(&value)?;
            Ok(resp)
        });

    let boundary = "xyz";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         hi\r\n\
         --{boundary}--\r\n"
    );

    let resp = app
        .client()
        .post("/upload")
        .header(
            "content-type",
            &format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .send()
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = resp.json();
    assert_eq!(value["note"], "hi");
}
