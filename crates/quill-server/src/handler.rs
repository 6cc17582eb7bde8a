use std::collections::HashMap;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::Form;
use quill_db::DbError;
use serde_json::{json, Value};

use crate::auth::check_author;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::validation::{
    parse_post_id, required_params, validate_body, validate_new_password, validate_password,
    validate_title, validate_username,
};

type FormBody = Result<Form<HashMap<String, String>>, FormRejection>;
type JsonResult = ApiResult<Json<Value>>;

fn form_fields(body: FormBody) -> ApiResult<HashMap<String, String>> {
    body.map(|Form(fields)| fields).map_err(|rejection| {
        tracing::debug!(%rejection, "rejected request body");
        ApiError::MalformedBody
    })
}

/// Landing message.
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!(
            "Quill blog API v{}. POST forms to /user/* and /blog/*, GET /blog/getall to browse.",
            env!("CARGO_PKG_VERSION")
        ),
    }))
}

pub async fn create_user(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [username, password] = required_params(&form, ["username", "password"])?;
    validate_username(username)?;
    validate_password(password)?;

    // Skip the expensive derivation for names that are obviously taken.
    if state.db.user_exists(username).await? {
        return Err(ApiError::UsernameTaken(username.to_string()));
    }
    let record = state.auth.new_credentials(username, password).await?;
    state.db.create_user(&record).await?;
    let token = state.db.generate_token(username).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User created.",
        "token": token,
    })))
}

pub async fn login(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [username, password] = required_params(&form, ["username", "password"])?;
    validate_username(username)?;
    validate_password(password)?;
    state.auth.authenticate(username, password).await?;

    state.db.clean_expired_tokens(username).await?;
    let token = state.db.generate_token(username).await?;
    tracing::info!(username, "login");

    Ok(Json(json!({ "success": true, "token": token })))
}

pub async fn remove_user(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [username, password] = required_params(&form, ["username", "password"])?;
    validate_username(username)?;
    validate_password(password)?;
    state.auth.authenticate(username, password).await?;

    state.db.remove_user(username).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn change_password(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [username, password, new_password] =
        required_params(&form, ["username", "password", "newPassword"])?;
    validate_username(username)?;
    validate_password(password)?;
    validate_new_password(new_password)?;
    state.auth.authenticate(username, password).await?;

    state.db.remove_all_tokens(username).await?;
    let record = state.auth.new_credentials(username, new_password).await?;
    state.db.set_user_password(&record).await?;
    let token = state.db.generate_token(username).await?;

    Ok(Json(json!({ "success": true, "token": token })))
}

pub async fn all_users(State(state): State<AppState>) -> JsonResult {
    let users = state.db.get_all_users().await.map_err(|e| {
        tracing::error!(error = %e, "listing users failed");
        ApiError::NotFound("Failed to get all the users.".into())
    })?;
    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn random_user(State(state): State<AppState>) -> JsonResult {
    let not_found = |e: Option<DbError>| {
        if let Some(e) = e {
            tracing::error!(error = %e, "picking a random user failed");
        }
        ApiError::NotFound("No user available.".into())
    };
    let username = state
        .db
        .random_user()
        .await
        .map_err(|e| not_found(Some(e)))?
        .ok_or_else(|| not_found(None))?;
    let posts = state
        .db
        .get_user_posts(&username)
        .await
        .map_err(|e| not_found(Some(e)))?;
    Ok(Json(json!({
        "success": true,
        "username": username,
        "posts_ids": posts,
    })))
}

pub async fn add_post(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [token, title, body] = required_params(&form, ["token", "title", "body"])?;
    validate_title(title)?;
    validate_body(body)?;
    let author = state.auth.resolve_author(token).await?;

    let id = state.db.create_post(&author, title, body).await?;
    Ok(Json(json!({ "success": true, "post_id": id })))
}

pub async fn get_post(State(state): State<AppState>, Path(blog_id): Path<String>) -> JsonResult {
    let id = parse_post_id(&blog_id)?;
    let post = state.db.get_post(id).await?;
    Ok(Json(json!({ "success": true, "post": post })))
}

pub async fn remove_post(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [token, blog_id] = required_params(&form, ["token", "blogId"])?;
    let author = state.auth.resolve_author(token).await?;
    let id = parse_post_id(blog_id)?;
    let post = state.db.get_post(id).await?;
    check_author(&post, &author)?;

    state.db.remove_post(&author, id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn update_post(State(state): State<AppState>, body: FormBody) -> JsonResult {
    let form = form_fields(body)?;
    let [token, title, body, blog_id] =
        required_params(&form, ["token", "title", "body", "blogId"])?;
    validate_title(title)?;
    validate_body(body)?;
    let author = state.auth.resolve_author(token).await?;
    let id = parse_post_id(blog_id)?;
    let post = state.db.get_post(id).await?;
    check_author(&post, &author)?;

    state.db.update_post(id, title, body).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn user_posts(State(state): State<AppState>, Path(username): Path<String>) -> JsonResult {
    let posts = state.db.get_user_posts(&username).await.map_err(|e| {
        tracing::error!(error = %e, %username, "listing user posts failed");
        ApiError::NotFound("No posts found.".into())
    })?;
    Ok(Json(json!({ "success": true, "posts_ids": posts })))
}

pub async fn random_post(State(state): State<AppState>) -> JsonResult {
    let not_found = |e: Option<DbError>| {
        if let Some(e) = e {
            tracing::error!(error = %e, "picking a random post failed");
        }
        ApiError::NotFound("Couldn't find any post.".into())
    };
    let post = state
        .db
        .random_post()
        .await
        .map_err(|e| not_found(Some(e)))?
        .ok_or_else(|| not_found(None))?;
    Ok(Json(json!({ "success": true, "post": post })))
}

pub async fn all_posts(State(state): State<AppState>) -> JsonResult {
    let posts = state.db.get_all_posts().await?;
    Ok(Json(json!({ "success": true, "posts_ids": posts })))
}
