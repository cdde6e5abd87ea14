use std::sync::Arc;

use common::DiskRegistry;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub disks: Arc<DiskRegistry>,
    pub config: AppConfig,
}
