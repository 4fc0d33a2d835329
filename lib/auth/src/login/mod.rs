//! The OAuth2 authorization code login flow.
//!
//! [`LoginFlow::issue_login_url`] stores a fresh CSRF state value and embeds
//! it in the provider's authorization URL. When the provider redirects back,
//! [`LoginFlow::handle_callback`] checks the echoed state, exchanges the
//! code through an [`AuthCodeExchanger`] and returns the identity token.
//!
//! Only one login can be in flight at a time: issuing a new URL replaces
//! the stored state, so a callback for an earlier URL is rejected.

mod exchanger;
mod flow;
mod provider;
mod state;

pub use exchanger::{AuthCodeExchanger, ProviderToken};
pub use flow::{CallbackParams, IdentityToken, LoginFlow, StateGenerator, generate_state_value};
pub use provider::OAuth2CodeExchanger;
pub use state::CsrfStateStore;
