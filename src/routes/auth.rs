use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, AuthUser, CurrentUser};
use crate::credentials::{authenticate, hash_password};
use crate::error::AppError;
use crate::flash::{self, Flash, Level};
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::models::User;
use crate::routes::redirect;
use crate::store::StoreError;
use crate::AppState;

const LOGIN_FAILED: &str = "Your email or password doesn't match!";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    email: String,
    errors: FieldErrors,
    flashes: Vec<Flash>,
    user: Option<User>,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    email: String,
    errors: FieldErrors,
    flashes: Vec<Flash>,
    user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout))
}

async fn render_register(
    session: &Session,
    user: Option<User>,
    email: String,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let template = RegisterTemplate {
        email,
        errors,
        flashes: flash::take(session).await?,
        user,
    };
    Ok(Html(template.render()?).into_response())
}

async fn render_login(
    session: &Session,
    user: Option<User>,
    email: String,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let template = LoginTemplate {
        email,
        errors,
        flashes: flash::take(session).await?,
        user,
    };
    Ok(Html(template.render()?).into_response())
}

async fn register_page(session: Session, CurrentUser(user): CurrentUser) -> Result<Response, AppError> {
    render_register(&session, user, String::new(), FieldErrors::default()).await
}

async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let errors = form.validate(&state.store).await?;
    if !errors.is_empty() {
        return render_register(&session, user, form.email, errors).await;
    }

    create_account(&state, &session, user, form).await
}

/// Store an already validated registration.
async fn create_account(
    state: &AppState,
    session: &Session,
    user: Option<User>,
    form: RegisterForm,
) -> Result<Response, AppError> {
    let password_hash = hash_password(&form.password)?;
    match state.store.create_user(form.email.trim(), &password_hash).await {
        Ok(created) => {
            tracing::info!(user_id = created.id, "user registered");
            flash::push(session, Level::Success, "Yay, you registered!").await?;
            Ok(redirect("/"))
        }
        // Lost the race against a concurrent registration.
        Err(StoreError::DuplicateEmail) => {
            tracing::warn!("duplicate email at insert time");
            flash::push(session, Level::Error, "User with that email already exists.").await?;
            render_register(session, user, form.email, FieldErrors::default()).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_page(session: Session, CurrentUser(user): CurrentUser) -> Result<Response, AppError> {
    render_login(&session, user, String::new(), FieldErrors::default()).await
}

async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let errors = form.validate();
    if errors.is_empty() {
        match authenticate(&state.store, form.email.trim(), &form.password).await? {
            Some(account) => {
                login_user(&session, &account).await?;
                tracing::info!(user_id = account.id, "user logged in");
                flash::push(
                    &session,
                    Level::Success,
                    format!("You've been logged in with {}!", account.email),
                )
                .await?;
                return Ok(redirect("/"));
            }
            None => {
                tracing::info!("failed login attempt");
                flash::push(&session, Level::Error, LOGIN_FAILED).await?;
            }
        }
    }

    render_login(&session, user, form.email, errors).await
}

async fn logout(session: Session, AuthUser(user): AuthUser) -> Result<Response, AppError> {
    logout_user(&session).await?;
    tracing::info!(user_id = user.id, "user logged out");
    flash::push(&session, Level::Success, "You've been logged out!").await?;
    Ok(redirect("/"))
}
