use std::time::Duration;

use docwatch_core::Token;
use docwatch_engine::{FailureKind, FetchSettings, HttpPageChecker, PageChecker, PageFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE: &str = "<html><body><table>\
    <tr><td>Number</td><td>Date</td></tr>\
    <tr><td> 123456 </td><td>01.02.2024</td></tr>\
    </table></body></html>";

async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

fn token(text: &str) -> Token {
    Token::new(text).unwrap()
}

#[tokio::test]
async fn checker_finds_token_in_table_cell() {
    let server = serve(
        "/list",
        ResponseTemplate::new(200).set_body_raw(TABLE, "text/html; charset=utf-8"),
    )
    .await;
    let checker =
        HttpPageChecker::new(&format!("{}/list", server.uri()), FetchSettings::default()).unwrap();

    assert!(checker.check(&token("123456")).await.unwrap());
    assert!(!checker.check(&token("654321")).await.unwrap());
}

#[tokio::test]
async fn checker_decodes_windows_1251_pages() {
    // <td>Готово</td> encoded as windows-1251
    let mut body = b"<html><body><table><tr><td>".to_vec();
    body.extend_from_slice(b"\xc3\xee\xf2\xee\xe2\xee");
    body.extend_from_slice(b"</td></tr></table></body></html>");
    let server = serve(
        "/ru",
        ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=windows-1251"),
    )
    .await;
    let checker =
        HttpPageChecker::new(&format!("{}/ru", server.uri()), FetchSettings::default()).unwrap();

    assert!(checker.check(&token("готово")).await.unwrap());
}

#[tokio::test]
async fn http_error_is_an_error_not_a_miss() {
    let server = serve("/missing", ResponseTemplate::new(503)).await;
    let checker =
        HttpPageChecker::new(&format!("{}/missing", server.uri()), FetchSettings::default())
            .unwrap();

    let err = checker.check(&token("123456")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn slow_page_times_out() {
    let server = serve(
        "/slow",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(250))
            .set_body_raw(TABLE, "text/html"),
    )
    .await;
    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let checker = HttpPageChecker::new(&format!("{}/slow", server.uri()), settings).unwrap();

    let err = checker.check(&token("123456")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let server = serve(
        "/large",
        ResponseTemplate::new(200).set_body_raw("01234567890", "text/html"),
    )
    .await;
    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = PageFetcher::new(settings).unwrap();
    let url = url::Url::parse(&format!("{}/large", server.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = serve(
        "/json",
        ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
    )
    .await;
    let checker =
        HttpPageChecker::new(&format!("{}/json", server.uri()), FetchSettings::default()).unwrap();

    let err = checker.check(&token("1")).await.unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::UnsupportedContentType { .. }
    ));
}

#[tokio::test]
async fn redirect_loop_hits_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/loop", server.uri())),
        )
        .mount(&server)
        .await;
    let settings = FetchSettings {
        redirect_limit: 2,
        ..FetchSettings::default()
    };
    let checker = HttpPageChecker::new(&format!("{}/loop", server.uri()), settings).unwrap();

    let err = checker.check(&token("123456")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
}

#[test]
fn malformed_url_is_rejected_up_front() {
    let err = HttpPageChecker::new("not a url", FetchSettings::default()).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
