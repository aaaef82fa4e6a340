//! Transfer request assembly.
//!
//! Pure data transforms between the three transient record shapes of a
//! callback: the validated request parameters, the identity returned by the
//! Galaxy webhook API, and the field map POSTed to the NeLS portal.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::BridgeError;

/// Transfer direction requested by the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bring files from NeLS storage into the Galaxy instance
    Import,

    /// Send a Galaxy history out to NeLS storage
    Export,
}

impl Action {
    /// The webhook endpoint slug for this action, e.g. `nels_import_history`.
    pub fn webhook_name(&self) -> String {
        format!("nels_{}_history", self)
    }
}

impl FromStr for Action {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import" => Ok(Action::Import),
            "export" => Ok(Action::Export),
            other => Err(BridgeError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Import => write!(f, "import"),
            Action::Export => write!(f, "export"),
        }
    }
}

/// Caller identity as reported by the Galaxy webhook API.
///
/// The history fields are only populated by the export webhook; the import
/// webhook returns just the user triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub userid: String,
    pub email: String,

    /// Encrypted history identifier (export only)
    pub history: Option<String>,

    /// Display name of the history (export only)
    pub historyname: Option<String>,
}

impl Identity {
    /// Extract an identity from a decoded webhook response.
    ///
    /// The value must already be known to be a JSON object. An `error` key
    /// takes precedence over everything else: the webhook returns
    /// `{"error": "User not logged in"}` style payloads instead of identity
    /// fields when the session is invalid or no history exists.
    pub fn from_response(value: &Value) -> Result<Self, BridgeError> {
        if let Some(message) = value.get("error") {
            let message = message
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| message.to_string());
            return Err(BridgeError::Upstream(message));
        }

        Ok(Identity {
            username: required_str(value, "username")?,
            userid: required_str(value, "userid")?,
            email: required_str(value, "email")?,
            history: optional_str(value, "history"),
            historyname: optional_str(value, "historyname"),
        })
    }
}

fn required_str(value: &Value, key: &'static str) -> Result<String, BridgeError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(BridgeError::MissingIdentityField(key))
}

fn optional_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Field map POSTed form-encoded to the NeLS portal to initiate a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFields {
    pub action: Action,
    pub user: String,
    pub userid: String,
    pub username: String,
    pub email: String,

    /// Root URL of the originating Galaxy instance
    pub galaxy: String,

    /// Display name shown in progress reporting
    pub historyname: String,

    /// Full path of the file to import (import only)
    pub historyfile: Option<String>,

    /// Encrypted history identifier (export only)
    pub history: Option<String>,

    /// NeLS directory to export the history archive into (export only)
    pub nels_directory: Option<String>,
}

impl TransferFields {
    /// Serialize to the key-value pairs sent as the form-encoded POST body.
    pub fn to_form_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("action", self.action.to_string()),
            ("user", self.user.clone()),
            ("userid", self.userid.clone()),
            ("username", self.username.clone()),
            ("email", self.email.clone()),
            ("galaxy", self.galaxy.clone()),
            ("historyname", self.historyname.clone()),
        ];

        if let Some(ref historyfile) = self.historyfile {
            pairs.push(("historyfile", historyfile.clone()));
        }
        if let Some(ref history) = self.history {
            pairs.push(("history", history.clone()));
        }
        if let Some(ref nels_directory) = self.nels_directory {
            pairs.push(("nels_directory", nels_directory.clone()));
        }

        pairs
    }
}

/// Build the transfer field map for one callback.
///
/// For imports, `selected_files` is a comma-separated list of NeLS file
/// paths; only the first entry is used and its basename becomes the display
/// name. For exports, `selected_files` is the path of a single NeLS
/// directory, passed through verbatim, and the history fields come from the
/// identity response.
pub fn build_transfer_fields(
    action: Action,
    identity: &Identity,
    selected_files: &str,
    galaxy_root: &str,
) -> Result<TransferFields, BridgeError> {
    let mut fields = TransferFields {
        action,
        user: identity.username.clone(),
        userid: identity.userid.clone(),
        username: identity.username.clone(),
        email: identity.email.clone(),
        galaxy: galaxy_root.to_string(),
        historyname: String::new(),
        historyfile: None,
        history: None,
        nels_directory: None,
    };

    match action {
        Action::Import => {
            // Only the first of the selected files is imported. A trailing
            // separator yields an empty display name, matching the lenient
            // handling of the callback page.
            let first = selected_files.split(',').next().unwrap_or("");
            let basename = first.rsplit('/').next().unwrap_or("");
            fields.historyname = basename.to_string();
            fields.historyfile = Some(first.to_string());
        }
        Action::Export => {
            let history = identity
                .history
                .clone()
                .ok_or(BridgeError::MissingIdentityField("history"))?;
            let historyname = identity
                .historyname
                .clone()
                .ok_or(BridgeError::MissingIdentityField("historyname"))?;

            fields.history = Some(history);
            fields.historyname = historyname;
            fields.nels_directory = Some(selected_files.to_string());
        }
    }

    Ok(fields)
}
