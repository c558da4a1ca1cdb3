use askama::Template;
use axum::{extract::State, response::Html, Form};

use crate::error::AppError;
use crate::state::AppState;
use crate::web::form::{
    FormFields, InProcessSubmitter, RegistrationForm, AUTO_RESET_AFTER, DEPARTMENTS, EVENTS,
    YEARS,
};

pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

fn options(choices: &'static [&'static str], current: &str) -> Vec<SelectOption> {
    choices
        .iter()
        .map(|&value| SelectOption {
            value,
            selected: value == current,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub fields: FormFields,
    pub error: Option<String>,
    pub departments: Vec<SelectOption>,
    pub years: Vec<SelectOption>,
    pub events: Vec<SelectOption>,
}

impl RegisterTemplate {
    fn new(fields: FormFields, error: Option<String>) -> Self {
        Self {
            departments: options(DEPARTMENTS, &fields.department),
            years: options(YEARS, &fields.year_semester),
            events: options(EVENTS, &fields.event_selection),
            fields,
            error,
        }
    }
}

#[derive(Template)]
#[template(path = "register_success.html")]
pub struct RegisterSuccessTemplate {
    pub reset_after_secs: u64,
}

pub async fn register_page() -> Result<Html<String>, AppError> {
    let form = RegistrationForm::new();
    let template = RegisterTemplate::new(form.fields().clone(), None);
    Ok(Html(template.render()?))
}

pub async fn register_form_handler(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> Result<Html<String>, AppError> {
    let submitter = InProcessSubmitter::new(state.store.clone());
    let mut form = RegistrationForm::with_fields(fields);
    form.submit(&submitter).await;

    if form.is_success() {
        let template = RegisterSuccessTemplate {
            reset_after_secs: AUTO_RESET_AFTER.as_secs(),
        };
        return Ok(Html(template.render()?));
    }

    let error = form.error_message().map(str::to_string);
    let template = RegisterTemplate::new(form.fields().clone(), error);
    Ok(Html(template.render()?))
}
