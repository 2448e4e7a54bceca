use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tower_sessions::Session;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::flash::{self, Flash, Level};
use crate::forms::{FieldErrors, LearningForm};
use crate::models::entry::canonical_timestamp;
use crate::models::{LearningEntry, User};
use crate::routes::redirect;
use crate::slug::slugify;
use crate::store::INDEX_LIMIT;
use crate::AppState;

#[derive(Template)]
#[template(path = "entries/list.html")]
struct EntryListTemplate {
    entries: Vec<LearningEntry>,
    tag: Option<String>,
    flashes: Vec<Flash>,
    user: Option<User>,
}

#[derive(Template)]
#[template(path = "entries/details.html")]
struct EntryDetailsTemplate {
    entry: LearningEntry,
    flashes: Vec<Flash>,
    user: Option<User>,
}

#[derive(Template)]
#[template(path = "entries/form.html")]
struct EntryFormTemplate {
    heading: &'static str,
    action: String,
    form: LearningForm,
    errors: FieldErrors,
    flashes: Vec<Flash>,
    user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/details/{timestamp}", get(details))
        .route("/entries/{tag}", get(tagged_entries))
        .route("/new", get(new_entry_form).post(create_entry))
        .route("/edit/{timestamp}", get(edit_entry_form).post(update_entry))
        .route("/entries/delete/{timestamp}", get(delete_entry))
}

/// Resolve a timestamp path segment to one of `user`'s entries.
async fn owned_entry(state: &AppState, user: &User, raw: &str) -> Result<(String, LearningEntry), AppError> {
    let timestamp = canonical_timestamp(raw).ok_or(AppError::NotFound)?;
    let entry = state
        .store
        .entry_by_timestamp(user.id, &timestamp)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok((timestamp, entry))
}

async fn render_form(
    session: &Session,
    user: User,
    heading: &'static str,
    action: String,
    form: LearningForm,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let template = EntryFormTemplate {
        heading,
        action,
        form,
        errors,
        flashes: flash::take(session).await?,
        user: Some(user),
    };
    Ok(Html(template.render()?).into_response())
}

async fn index(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.store.entries_for_user(user.id, INDEX_LIMIT).await?;

    let template = EntryListTemplate {
        entries,
        tag: None,
        flashes: flash::take(&session).await?,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn details(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(timestamp): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (_, entry) = owned_entry(&state, &user, &timestamp).await?;

    let template = EntryDetailsTemplate {
        entry,
        flashes: flash::take(&session).await?,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn tagged_entries(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(tag): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tag = slugify(&tag);
    // An empty needle would match every entry.
    let entries = if tag.is_empty() {
        Vec::new()
    } else {
        state.store.entries_tagged(user.id, &tag).await?
    };

    let template = EntryListTemplate {
        entries,
        tag: Some(tag),
        flashes: flash::take(&session).await?,
        user: Some(user),
    };
    Ok(Html(template.render()?))
}

async fn new_entry_form(session: Session, AuthUser(user): AuthUser) -> Result<Response, AppError> {
    render_form(
        &session,
        user,
        "New Entry",
        "/new".to_string(),
        LearningForm::default(),
        FieldErrors::default(),
    )
    .await
}

async fn create_entry(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Form(form): Form<LearningForm>,
) -> Result<Response, AppError> {
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            return render_form(&session, user, "New Entry", "/new".to_string(), form, errors).await;
        }
    };

    let entry = state.store.insert_entry(user.id, &data).await?;
    tracing::info!(user_id = user.id, timestamp = %entry.timestamp_of_entry, "entry created");

    flash::push(&session, Level::Success, "Yay, you added a learning!").await?;
    Ok(redirect("/"))
}

async fn edit_entry_form(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(timestamp): Path<String>,
) -> Result<Response, AppError> {
    let (_, entry) = owned_entry(&state, &user, &timestamp).await?;

    let action = format!("/edit/{}", entry.key());
    let form = LearningForm::from(&entry);
    render_form(&session, user, "Edit Entry", action, form, FieldErrors::default()).await
}

async fn update_entry(
    State(state): State<AppState>,
    session: Session,
    AuthUser(user): AuthUser,
    Path(timestamp): Path<String>,
    Form(form): Form<LearningForm>,
) -> Result<Response, AppError> {
    let (timestamp, entry) = owned_entry(&state, &user, &timestamp).await?;

    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            let action = format!("/edit/{}", entry.key());
            return render_form(&session, user, "Edit Entry", action, form, errors).await;
        }
    };

    let updated = state.store.update_entry(user.id, &timestamp, &data).await?;
    tracing::info!(user_id = user.id, %timestamp, updated, "entry updated");

    flash::push(&session, Level::Success, "Yay, you updated a learning!").await?;
    Ok(redirect("/"))
}

async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(timestamp): Path<String>,
) -> Result<Response, AppError> {
    let (timestamp, _) = owned_entry(&state, &user, &timestamp).await?;

    let deleted = state.store.delete_entry(user.id, &timestamp).await?;
    tracing::info!(user_id = user.id, %timestamp, deleted, "entry deleted");

    Ok(redirect("/"))
}
