// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, answers, auth, catalog, questions, stats},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Everything is served under `/api`.
/// * Signup, login and the exam list are public; the rest needs a bearer token.
/// * `/api/admin` additionally requires the `admin` role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/exams", get(catalog::list_exams));

    let user_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/me/exam", put(auth::set_exam))
        .route("/categories", get(catalog::list_categories))
        .route("/questions/generate", post(questions::generate_questions))
        .route("/answers", post(answers::save_answer))
        .route("/answers/correct", get(answers::list_correct_answers))
        .route("/stats", get(stats::get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/exams",
            get(admin::exams::list_exams).post(admin::exams::create_exam),
        )
        .route(
            "/exams/{id}",
            put(admin::exams::update_exam).delete(admin::exams::delete_exam),
        )
        .route(
            "/exams/{id}/deletion-impact",
            get(admin::exams::exam_deletion_impact),
        )
        .route(
            "/exams/{id}/categories",
            get(admin::exams::list_exam_categories),
        )
        .route(
            "/exams/{id}/categories/{category_id}",
            post(admin::exams::add_exam_category).delete(admin::exams::remove_exam_category),
        )
        .route(
            "/categories",
            get(admin::categories::list_categories).post(admin::categories::create_category),
        )
        .route(
            "/categories/{id}",
            put(admin::categories::update_category).delete(admin::categories::delete_category),
        )
        .route(
            "/categories/{id}/deletion-impact",
            get(admin::categories::category_deletion_impact),
        )
        .route("/questions", post(admin::questions::create_question))
        .route(
            "/question-library/stats",
            get(admin::stats::question_library_stats),
        )
        .route("/stats", get(admin::stats::daily_stats))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
