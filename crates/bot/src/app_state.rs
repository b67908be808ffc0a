use std::{sync::Arc, time::Duration};

use panels::{MessageTransport, PanelRegistry};
use shared::domain::UserId;
use storage::Storage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) storage: Storage,
    pub(crate) transport: Arc<dyn MessageTransport>,
    pub(crate) panels: Arc<PanelRegistry>,
    pub(crate) panel_timeout: Option<Duration>,
    pub(crate) admins: Vec<UserId>,
}
