//! API credentials from the environment.
//!
//! The platform issues an `API_ID`/`API_HASH` pair per application and the
//! account logs in with its phone number. These values are only ever read
//! by sessions; nothing else in the crate looks at them.

use std::fmt;

use crate::error::{HarvestError, Result};

/// Environment variable holding the numeric application id.
pub const API_ID_VAR: &str = "API_ID";
/// Environment variable holding the application hash.
pub const API_HASH_VAR: &str = "API_HASH";
/// Environment variable holding the account phone number.
pub const PHONE_VAR: &str = "PHONE";

/// Application credentials plus the account phone number.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_id: i32,
    api_hash: String,
    phone: String,
}

impl Credentials {
    /// Builds credentials after validating each field.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Auth`] if the id is not positive, the hash is
    /// empty, or the phone number is not in `+<digits>` form.
    pub fn new(api_id: i32, api_hash: impl Into<String>, phone: impl Into<String>) -> Result<Self> {
        let api_hash = api_hash.into();
        let phone: String = phone.into().chars().filter(|c| !c.is_whitespace()).collect();

        if api_id <= 0 {
            return Err(HarvestError::auth(format!("{API_ID_VAR} must be positive")));
        }
        if api_hash.trim().is_empty() {
            return Err(HarvestError::auth(format!("{API_HASH_VAR} is empty")));
        }
        let digits = phone.strip_prefix('+').unwrap_or_default();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(HarvestError::auth(format!(
                "{PHONE_VAR} must be in international format, e.g. +15551234567"
            )));
        }

        Ok(Self {
            api_id,
            api_hash: api_hash.trim().to_string(),
            phone,
        })
    }

    /// Reads credentials from the process environment.
    ///
    /// Returns `Ok(None)` when none of the variables is set.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through an arbitrary lookup function.
    ///
    /// Blank values count as unset. Either all three variables are set or
    /// none is.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Auth`] when only some variables are set or a
    /// value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_id = get(API_ID_VAR);
        let api_hash = get(API_HASH_VAR);
        let phone = get(PHONE_VAR);

        let (api_id, api_hash, phone) = match (api_id, api_hash, phone) {
            (None, None, None) => return Ok(None),
            (Some(id), Some(hash), Some(phone)) => (id, hash, phone),
            (id, hash, phone) => {
                let missing: Vec<&str> = [
                    (id.is_none(), API_ID_VAR),
                    (hash.is_none(), API_HASH_VAR),
                    (phone.is_none(), PHONE_VAR),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                return Err(HarvestError::auth(format!(
                    "incomplete credentials, missing {}",
                    missing.join(", ")
                )));
            }
        };

        let api_id = api_id
            .trim()
            .parse::<i32>()
            .map_err(|_| HarvestError::auth(format!("{API_ID_VAR} must be an integer")))?;

        Self::new(api_id, api_hash, phone).map(Some)
    }

    /// The application id.
    pub fn api_id(&self) -> i32 {
        self.api_id
    }

    /// The application hash.
    pub fn api_hash(&self) -> &str {
        &self.api_hash
    }

    /// The account phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Phone number with all but the country prefix and last two digits hidden.
    pub fn masked_phone(&self) -> String {
        let digits: Vec<char> = self.phone.chars().skip(1).collect();
        let keep_tail = digits.len().min(2);
        let keep_head = (digits.len() - keep_tail).min(1);
        let hidden = digits.len() - keep_tail - keep_head;

        let mut masked = String::from("+");
        masked.extend(&digits[..keep_head]);
        masked.extend(std::iter::repeat_n('*', hidden));
        masked.extend(&digits[digits.len() - keep_tail..]);
        masked
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone", &self.masked_phone())
            .finish()
    }
}
