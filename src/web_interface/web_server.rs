use std::net::SocketAddr;
use std::sync::Arc;

use warp::Filter;

use crate::error_handling::types::WebError;
use crate::web_interface::routes::{asset_route, timeline_route};
use crate::web_interface::types::AppState;

/// Web server for the timeline page and its static assets.
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Start the web server on the given port. Runs until the process exits.
    pub async fn start(&self, port: u16) -> Result<(), WebError> {
        let routes = timeline_route(self.state.clone()).or(asset_route());

        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        warp::serve(routes).run(addr).await;

        Ok(())
    }
}
