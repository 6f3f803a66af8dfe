//! Integration tests for the detail and results pages

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use common::{body_string, database::*, fixtures::*, location, Browser};
use kupolls::constants::VOTING_NOT_ALLOWED;

#[actix_rt::test]
async fn test_future_question_redirects_with_notice() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let question = create_question(&db, "Future question.", 5, 6)
        .await
        .expect("Failed to create question");
    let app = test_app!(db);
    let mut browser = Browser::new();

    let resp = browse_get!(app, browser, &format!("/polls/{}/", question.id));
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/polls/");

    // The notice is shown once on the next page.
    let body = body_string(browse_get!(app, browser, "/polls/")).await;
    assert!(body.contains(VOTING_NOT_ALLOWED));

    let body = body_string(browse_get!(app, browser, "/polls/")).await;
    assert!(!body.contains(VOTING_NOT_ALLOWED));
}

#[actix_rt::test]
async fn test_past_question_redirects() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let question = create_question(&db, "Past Question.", -30, -29)
        .await
        .expect("Failed to create question");
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri(&format!("/polls/{}/", question.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_rt::test]
async fn test_open_question_renders_choices() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let (question, choices) = create_open_question(&db, "Best language?", &["Rust", "Python"])
        .await
        .expect("Failed to create question");
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri(&format!("/polls/{}/", question.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Best language?"));
    assert!(body.contains("Rust"));
    assert!(body.contains("Python"));
    assert!(body.contains(&format!("value=\"{}\"", choices[0].id)));
    assert!(body.contains("name=\"csrf_token\""));
    assert!(!body.contains(" checked"));
}

#[actix_rt::test]
async fn test_unknown_question_is_404() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let app = test_app!(db);

    for uri in ["/polls/999/", "/polls/999/results/", "/polls/abc/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_results_are_not_gated_by_window() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let question = create_question(&db, "Closed question.", -30, -29)
        .await
        .expect("Failed to create question");
    kupolls::admin::add_choice(&db, question.id, "Only choice")
        .await
        .expect("Failed to add choice")
        .expect("question exists");
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri(&format!("/polls/{}/results/", question.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Closed question."));
    assert!(body.contains("Only choice"));
    assert!(!body.contains("Vote again?"));
}

#[actix_rt::test]
async fn test_results_of_open_question_offer_vote_again() {
    let db = setup_test_database().await.expect("Failed to setup test database");
    let (question, _) = create_open_question(&db, "Open question.", &["A", "B"])
        .await
        .expect("Failed to create question");
    let app = test_app!(db);

    let req = test::TestRequest::get()
        .uri(&format!("/polls/{}/results/", question.id))
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;

    assert!(body.contains("Vote again?"));
    assert!(body.contains(&format!("href=\"/polls/{}/\"", question.id)));
}
