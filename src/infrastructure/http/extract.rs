use crate::error::AppError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections render as the service's `{"detail": ...}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
