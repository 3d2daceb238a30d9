mod common;

use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use common::{StubResponse, StubServer, catalog_sheets, fixture_path};

#[test]
fn catalog_is_fetched_without_caching() {
    let body = fs::read(fixture_path("price_list.csv")).expect("read fixture");
    let server = StubServer::start(vec![StubResponse::ok(body)]);
    let url = server.url("/spreadsheets/d/PRICE/export?format=csv");

    catalog_sheets()
        .args(["catalog", "-i", url.as_str()])
        .assert()
        .success()
        .stdout(contains("Штрихкод"))
        .stdout(contains("Кофе молотый"))
        .stdout(contains(format!("Download: {url}")));

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    let head = requests[0].to_ascii_lowercase();
    assert!(head.starts_with("get /spreadsheets/d/price/export?format=csv "));
    assert!(head.contains("cache-control: no-store"));
}

#[test]
fn missing_export_renders_empty_catalog() {
    let server = StubServer::start(vec![StubResponse::status(404)]);
    let url = server.url("/export?format=xlsx");

    catalog_sheets()
        .args(["catalog", "-i", url.as_str()])
        .assert()
        .success()
        .stdout(contains("No data available."))
        .stdout(contains(format!("Download: {url}")))
        .stderr(contains("404"));

    server.finish();
}

#[test]
fn server_errors_yield_empty_card_list() {
    let server = StubServer::start(vec![StubResponse::status(500)]);
    let url = server.url("/promotions.xlsx");

    catalog_sheets()
        .args(["cards", "--feed", "promotions", "-i", url.as_str(), "-f", "json"])
        .assert()
        .success()
        .stdout("[]\n");

    server.finish();
}

#[test]
fn promotions_ask_for_ten_minute_revalidation() {
    let body = fs::read(fixture_path("offers.csv")).expect("read fixture");
    let server = StubServer::start(vec![StubResponse::ok(body)]);
    let url = server.url("/offers?format=csv");

    catalog_sheets()
        .args(["cards", "--feed", "promotions", "-i", url.as_str()])
        .assert()
        .success()
        .stdout(contains("Зелёный чай"))
        .stdout(contains("-15%"));

    let requests = server.finish();
    assert!(requests[0].to_ascii_lowercase().contains("cache-control: max-age=600"));
}

#[test]
fn articles_are_fetched_without_caching() {
    let body = fs::read(fixture_path("offers.csv")).expect("read fixture");
    let server = StubServer::start(vec![StubResponse::ok(body)]);
    let url = server.url("/blog?format=csv");

    catalog_sheets()
        .args(["cards", "--feed", "articles", "-i", url.as_str(), "-f", "csv"])
        .assert()
        .success()
        .stdout(contains(
            "\"title\",\"subtitle\",\"description\",\"discount\",\"image\"",
        ))
        .stdout(contains("\"Скидка на \"\"Сенча\"\"\""))
        .stdout(contains("-15%").not());

    let requests = server.finish();
    assert!(requests[0].to_ascii_lowercase().contains("cache-control: no-store"));
}
