use std::sync::Arc;

use crate::config::PickerConfig;
use crate::location::Geocoder;

pub struct AppState {
    pub geocoder: Arc<dyn Geocoder>,
    pub config: PickerConfig,
}
