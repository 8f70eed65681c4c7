/// UI module exports
pub mod components;
pub mod dashboard;
pub mod dialogs;
pub mod sidebar;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::gateway::SupabaseGateway;
use std::ops::Deref;
use std::rc::Rc;

/// Shared backend client handed down through component props
#[derive(Clone)]
pub struct GatewayHandle(Rc<SupabaseGateway>);

impl PartialEq for GatewayHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for GatewayHandle {
    type Target = SupabaseGateway;

    fn deref(&self) -> &SupabaseGateway {
        &self.0
    }
}

/// Build the backend client from the compiled-in configuration
pub fn connect() -> Result<GatewayHandle> {
    let config = BackendConfig::from_env()?;
    log::debug!("Backend at {}", config.url);
    Ok(GatewayHandle(Rc::new(SupabaseGateway::connect(config))))
}

/// Current time in Unix seconds
pub fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}
