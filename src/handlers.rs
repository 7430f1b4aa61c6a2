use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    http::Uri,
    Extension, Json,
};
use time::OffsetDateTime;

use crate::{
    authentication::{hash_password_argon2, AuthUser, Authenticator, MaybeUser, TOKEN_LIFETIME},
    data_formats::{
        ArticleFilter, ArticleResponse, LoginRequest, MultipleCommentsWrapper, ProfileResponse,
        RegisterRequest, UpdateUserRequest, UserResponse, UserWrapper,
    },
    errors::RequestError,
    models::Session,
    store::{ContentStore, LoginFailure, NewUser, UserChanges},
};

type UserJson = UserWrapper<UserResponse>;

type JsonResult<T> = Result<Json<T>, RequestError>;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RequestError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(RequestError::BadRequest(rejection.body_text()))
        }
    }
}

fn require(value: &str, message: &'static str) -> Result<(), RequestError> {
    if value.is_empty() {
        return Err(RequestError::Validation(message));
    }
    Ok(())
}

async fn hash_or_fail(password: String) -> Result<String, RequestError> {
    hash_password_argon2(password).await.map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        RequestError::ServerError
    })
}

// ----------------- Helper Handlers -----------------
pub async fn not_found(uri: Uri) -> RequestError {
    tracing::debug!(%uri, "No route matched");
    RequestError::NotFound
}

// ----------------- User Handlers -----------------
pub async fn login_user(
    Extension(store): Extension<Arc<ContentStore>>,
    Extension(authenticator): Extension<Arc<Authenticator>>,
    payload: Result<Json<UserWrapper<LoginRequest>>, JsonRejection>,
) -> JsonResult<UserJson> {
    let UserWrapper { user: request } = json_body(payload)?;
    require(&request.email, "email is required")?;
    require(&request.password, "password is required")?;

    let lookup = store.clone();
    let user = tokio::task::spawn_blocking(move || {
        lookup.find_user_by_credentials(&request.email, &request.password)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Credential check did not complete");
        RequestError::ServerError
    })?
    .map_err(|failure| match failure {
        LoginFailure::UnknownEmail => RequestError::InvalidCredentials("invalid email"),
        LoginFailure::WrongPassword => RequestError::InvalidCredentials("invalid password"),
    })?;

    let issued_at = OffsetDateTime::now_utc();
    let token = authenticator
        .issue_token_at(&user.username, issued_at)
        .map_err(|e| {
            tracing::error!(error = %e, "Token generation failed");
            RequestError::ServerError
        })?;
    store.open_session(
        token.clone(),
        Session {
            user_id: user.id,
            expires_at: (issued_at + TOKEN_LIFETIME).unix_timestamp(),
        },
    );
    tracing::info!(username = %user.username, "User logged in");
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn register_user(
    Extension(store): Extension<Arc<ContentStore>>,
    payload: Result<Json<UserWrapper<RegisterRequest>>, JsonRejection>,
) -> JsonResult<UserJson> {
    let UserWrapper { user: request } = json_body(payload)?;
    require(&request.username, "username is required")?;
    require(&request.email, "email is required")?;
    require(&request.password, "password is required")?;

    let password_hash = hash_or_fail(request.password).await?;
    let user = store.register_user(NewUser {
        username: request.username,
        email: request.email,
        password_hash,
        bio: request.bio,
        image: request.image,
    })?;
    tracing::info!(username = %user.username, "User registered");
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user,
        String::new(),
    ))))
}

/// Anonymous callers get an all-empty user rather than an error.
pub async fn get_current_user(MaybeUser(maybe_user): MaybeUser) -> Json<UserJson> {
    let result = match maybe_user {
        Some(AuthUser { user, token }) => UserResponse::new(user, token),
        None => UserResponse::default(),
    };
    Json(UserWrapper::wrap_with_user_data(result))
}

pub async fn update_user(
    MaybeUser(maybe_user): MaybeUser,
    Extension(store): Extension<Arc<ContentStore>>,
    payload: Result<Json<UserWrapper<UpdateUserRequest>>, JsonRejection>,
) -> JsonResult<UserJson> {
    let UserWrapper { user: request } = json_body(payload)?;
    let request = request.without_empty_fields();
    if request.is_empty() {
        return Err(RequestError::Validation("at least one field is required"));
    }
    let Some(AuthUser { user, token }) = maybe_user else {
        tracing::warn!("Profile update without a valid session");
        return Err(RequestError::NotAuthorized);
    };

    let password_hash = match request.password {
        Some(password) => Some(hash_or_fail(password).await?),
        None => None,
    };
    let updated = store.update_user(
        user.id,
        UserChanges {
            email: request.email,
            bio: request.bio,
            image: request.image,
            username: request.username,
            password_hash,
        },
    )?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        updated, token,
    ))))
}
// ----------------- End User Handlers -----------------

// ----------------- Profile Handlers -----------------
pub async fn get_profile(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(username): Path<String>,
) -> JsonResult<ProfileResponse> {
    require(&username, "username is required")?;
    Ok(Json(store.find_profile(&username).unwrap_or_default()))
}

// ----------------- Article Handlers -----------------
pub async fn list_articles(
    Extension(store): Extension<Arc<ContentStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<ArticleResponse>> {
    let filter = ArticleFilter::from_query(&params);
    Json(store.list_articles(&filter))
}

pub async fn get_article(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(slug): Path<String>,
) -> JsonResult<ArticleResponse> {
    require(&slug, "article slug is required")?;
    Ok(Json(store.find_article_by_slug(&slug).unwrap_or_default()))
}

// ----------------- Comment Handlers -----------------
pub async fn get_comments(
    Extension(store): Extension<Arc<ContentStore>>,
    Path(slug): Path<String>,
) -> JsonResult<MultipleCommentsWrapper> {
    require(&slug, "article slug is required")?;
    Ok(Json(MultipleCommentsWrapper {
        comments: store.list_comments(&slug),
    }))
}

// ----------------- Tag Handlers -----------------
pub async fn get_tags(Extension(store): Extension<Arc<ContentStore>>) -> Json<Vec<String>> {
    Json(store.list_tags())
}
