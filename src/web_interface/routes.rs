use std::sync::Arc;

use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use crate::enrich::color::RandomColors;
use crate::enrich::layout::enrich;
use crate::error_handling::types::{EnrichError, PipelineError, ReaderError};
use crate::reader::parse::read_conn_log;
use crate::web_interface::render::{render_message, render_timeline, Assets};
use crate::web_interface::types::AppState;

/// Run the whole pipeline for one request: read, parse, enrich, render.
fn build_timeline(state: &AppState) -> Result<String, PipelineError> {
    let input = state.source.read()?;
    let batch = read_conn_log(&input, state.policy)?;
    let mut colors = RandomColors::new();
    let enriched = enrich(&batch.records, state.min_duration, state.color_mode, &mut colors)?;
    Ok(render_timeline(&enriched)?)
}

/// Empty input and empty render sets are part of normal use; they get a
/// message page, not an error status.
fn user_facing_message(error: &PipelineError) -> Option<&'static str> {
    match error {
        PipelineError::ReaderError(ReaderError::EmptyInput) => {
            Some("The log contained no connection records.")
        }
        PipelineError::ReaderError(ReaderError::SourceExhausted) => {
            Some("Standard input was already consumed; restart with a file to re-render.")
        }
        PipelineError::EnrichError(EnrichError::EmptyBatch) => {
            Some("No connections survived the duration filter.")
        }
        _ => None,
    }
}

/// GET / -> the rendered timeline
pub fn timeline_route(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(move || {
        let state = state.clone();
        async move {
            let res = match build_timeline(&state) {
                Ok(html) => reply::html(html).into_response(),
                Err(error) => match user_facing_message(&error) {
                    Some(message) => {
                        reply::html(render_message("Nothing to show", message)).into_response()
                    }
                    None => {
                        log::error!("Timeline render failed: {}", error);
                        reply::with_status(
                            reply::html(render_message("Render failed", &error.to_string())),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        )
                        .into_response()
                    }
                },
            };
            Ok::<_, Rejection>(res)
        }
    })
}

/// GET /assets/:name -> embedded static files
pub fn asset_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("assets" / String)
        .and(warp::get())
        .and_then(|name: String| async move {
            let res = match Assets::get(&name) {
                Some(content) => {
                    let mime = mime_guess::from_path(&name).first_or_octet_stream();
                    reply::with_header(
                        content.data.into_owned(),
                        "Content-Type",
                        mime.as_ref().to_string(),
                    )
                    .into_response()
                }
                None => reply::with_status(
                    reply::html(render_message("Not found", "No such asset.")),
                    StatusCode::NOT_FOUND,
                )
                .into_response(),
            };
            Ok::<_, Rejection>(res)
        })
}
