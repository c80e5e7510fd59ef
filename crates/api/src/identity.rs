use tracing::debug;

use crate::error::Result;
use crate::models::{ConnectionData, IdentityRef};
use crate::transport::{send, Request, Target, Transport};
use crate::wiql::CURRENT_USER;

pub struct Identities<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Identities<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// The identity behind the stored credential.
    pub async fn me(&self) -> Result<IdentityRef> {
        let data: ConnectionData =
            send(self.transport, Request::get(Target::Org("connectionData".into()))).await?;
        debug!(id = %data.authenticated_user.id, "Resolved authenticated user");
        Ok(data.authenticated_user)
    }

    /// `@me` becomes the caller's identity id; anything else is already an id.
    pub async fn resolve_id(&self, value: &str) -> Result<String> {
        if value == CURRENT_USER {
            Ok(self.me().await?.id)
        } else {
            Ok(value.to_string())
        }
    }
}
