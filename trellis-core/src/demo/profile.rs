//! Logging of the fetched user.

use std::rc::Rc;

use crate::fetch::User;
use crate::platform::{LogLevel, Platform};

/// Effect keyed on the user record. Clearing the record logs nothing.
pub fn user_effect(platform: Rc<dyn Platform>, user: Option<Rc<User>>) -> impl FnOnce() + 'static {
    move || {
        if let Some(user) = user {
            platform.log(LogLevel::Info, &format!("user data updated: {}", user.name));
        }
    }
}
