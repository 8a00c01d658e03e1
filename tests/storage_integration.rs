// Upload/download API integration tests
use actix_web::{http::header, http::StatusCode, test, web, App, HttpServer};
use prost::Message;
use std::net::{SocketAddr, TcpListener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use ddss_storage::account::NewAccount;
use ddss_storage::api::{self, auth::basic_authorization_value, DOWNLOAD_PATH, UPLOAD_PATH};
use ddss_storage::app_state::AppState;

const CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA: i64 = 11;
const CATALOG_RECORD_ID_TO_DOWNLOAD_OK: i64 = 12;
const CATALOG_RECORD_ID_TO_DOWNLOAD_NOT_FOUND: i64 = 13;
const CATALOG_RECORD_ID_TO_UPLOAD_PERSON: i64 = 21;

const USERNAME: &str = "kuznetsov";
const PASSWORD: &str = "qwerty";

#[derive(Clone, PartialEq, Message)]
struct SensorsData {
    #[prost(int32, tag = "1")]
    degrees_celsius: i32,
    #[prost(int32, tag = "2")]
    pascals: i32,
    #[prost(int32, tag = "3")]
    meters_per_second: i32,
}

#[derive(Clone, PartialEq, Message)]
struct Person {
    #[prost(int32, tag = "1")]
    id: i32,
    #[prost(string, tag = "2")]
    name: String,
    #[prost(string, tag = "3")]
    surname: String,
    #[prost(string, tag = "4")]
    email: String,
}

fn sensors_data() -> SensorsData {
    SensorsData {
        degrees_celsius: 20,
        pascals: 100,
        meters_per_second: 4,
    }
}

fn person() -> Person {
    Person {
        id: 1,
        name: "Andrey".to_string(),
        surname: "Kuznetsov".to_string(),
        email: "example@example".to_string(),
    }
}

fn test_state() -> AppState {
    AppState::new_for_testing(&[NewAccount {
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
        about: None,
        ip_address: "127.0.0.1".to_string(),
        port: 9000,
        available_megabytes: 1024,
    }])
    .unwrap()
}

fn upload_request(id: i64, body: Vec<u8>, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("{}/{}", UPLOAD_PATH, id))
        .insert_header((header::AUTHORIZATION, basic_authorization_value(USERNAME, password)))
        .insert_header((header::CONTENT_TYPE, "application/octet-stream"))
        .set_payload(body)
}

fn download_request(id: i64, password: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(&format!("{}/{}", DOWNLOAD_PATH, id))
        .insert_header((header::AUTHORIZATION, basic_authorization_value(USERNAME, password)))
}

#[actix_web::test]
async fn post_upload_with_status_created() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let req = upload_request(CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA, sensors_data().encode_to_vec(), PASSWORD)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key(header::ETAG));

    let body = test::read_body(resp).await;
    let parsed = SensorsData::decode(body).unwrap();
    assert_eq!(parsed.degrees_celsius, 20);
    assert_eq!(parsed.pascals, 100);
    assert_eq!(parsed.meters_per_second, 4);
}

#[actix_web::test]
async fn get_download_with_status_ok() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let req = upload_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, sensors_data().encode_to_vec(), PASSWORD)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, download_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(header::LAST_MODIFIED));

    let body = test::read_body(resp).await;
    assert_eq!(SensorsData::decode(body).unwrap(), sensors_data());
}

#[actix_web::test]
async fn get_download_with_status_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let resp = test::call_service(
        &app,
        download_request(CATALOG_RECORD_ID_TO_DOWNLOAD_NOT_FOUND, PASSWORD).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn upload_two_diff_classes_objs_and_download_them() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let req = upload_request(CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA, sensors_data().encode_to_vec(), PASSWORD)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    let req = upload_request(CATALOG_RECORD_ID_TO_UPLOAD_PERSON, person().encode_to_vec(), PASSWORD).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        download_request(CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA, PASSWORD).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(SensorsData::decode(test::read_body(resp).await).unwrap(), sensors_data());

    let resp = test::call_service(
        &app,
        download_request(CATALOG_RECORD_ID_TO_UPLOAD_PERSON, PASSWORD).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed = Person::decode(test::read_body(resp).await).unwrap();
    assert_eq!(parsed.id, 1);
    assert_eq!(parsed.name, "Andrey");
    assert_eq!(parsed.surname, "Kuznetsov");
    assert_eq!(parsed.email, "example@example");
}

#[actix_web::test]
async fn upload_overwrites_previous_payload() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let first = sensors_data();
    let mut second = sensors_data();
    second.degrees_celsius = -7;

    for reading in [&first, &second] {
        let req = upload_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, reading.encode_to_vec(), PASSWORD).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(&app, download_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, PASSWORD).to_request()).await;
    assert_eq!(SensorsData::decode(test::read_body(resp).await).unwrap(), second);
}

#[actix_web::test]
async fn empty_message_round_trips() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    // all-default fields encode to zero bytes
    let empty = SensorsData::default().encode_to_vec();
    assert!(empty.is_empty());

    let req = upload_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, empty, PASSWORD).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, download_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(SensorsData::decode(test::read_body(resp).await).unwrap(), SensorsData::default());
}

#[actix_web::test]
async fn wrong_password_is_unauthorized_and_stores_nothing() {
    let state = test_state();
    let records = state.records.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(api::configure),
    )
    .await;

    let req = upload_request(CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA, sensors_data().encode_to_vec(), "wrong")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_some());
    assert!(!records.exists(CATALOG_RECORD_ID_TO_UPLOAD_SENSORS_DATA).unwrap());

    let resp = test::call_service(&app, download_request(CATALOG_RECORD_ID_TO_DOWNLOAD_OK, "wrong").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn missing_credentials_are_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("{}/{}", DOWNLOAD_PATH, CATALOG_RECORD_ID_TO_DOWNLOAD_OK))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri(&format!("{}/{}", UPLOAD_PATH, CATALOG_RECORD_ID_TO_DOWNLOAD_OK))
        .insert_header((header::AUTHORIZATION, "Bearer token"))
        .set_payload(vec![1, 2, 3])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

/// Send one raw HTTP/1.1 request and return the full response, lower-cased
async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_lowercase()
}

#[actix_web::test]
async fn head_reports_stored_length_on_the_wire() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let data = web::Data::new(test_state());
    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(api::configure))
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let auth = basic_authorization_value(USERNAME, PASSWORD);
    let upload = format!(
        "POST {}/12 HTTP/1.1\r\nHost: localhost\r\nAuthorization: {}\r\nContent-Length: 12\r\nConnection: close\r\n\r\ntwelve bytes",
        UPLOAD_PATH, auth
    );
    let response = raw_exchange(addr, upload.as_bytes()).await;
    assert!(response.starts_with("http/1.1 201"), "{}", response);

    let head = format!(
        "HEAD {}/12 HTTP/1.1\r\nHost: localhost\r\nAuthorization: {}\r\nConnection: close\r\n\r\n",
        DOWNLOAD_PATH, auth
    );
    let response = raw_exchange(addr, head.as_bytes()).await;
    assert!(response.starts_with("http/1.1 200"), "{}", response);
    assert!(response.contains("content-length: 12\r\n"), "{}", response);
    assert!(response.ends_with("\r\n\r\n"), "HEAD must not carry a body: {}", response);

    handle.stop(true).await;
}
