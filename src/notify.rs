//! Transient desktop notifications over org.freedesktop.Notifications

use std::collections::HashMap;

use zbus::zvariant::Value;

/// How long the notification stays up, in milliseconds
const EXPIRE_TIMEOUT_MS: i32 = 5_000;

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications",
    gen_blocking = false
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Show a transient notification; the returned future resolves once the
/// notification daemon has acknowledged it.
pub async fn send(summary: &str, body: &str) -> anyhow::Result<()> {
    let connection = zbus::Connection::session().await?;
    let proxy = NotificationsProxy::new(&connection).await?;

    let hints = HashMap::from([("transient", Value::from(true))]);
    proxy
        .notify(
            "snaptext",
            0,
            "edit-copy-symbolic",
            summary,
            body,
            Vec::new(),
            hints,
            EXPIRE_TIMEOUT_MS,
        )
        .await?;
    Ok(())
}

/// Like [`send`], but only logs on failure. A missing notification daemon
/// should never abort the copy flow.
pub async fn send_or_log(summary: String, body: String) {
    if let Err(err) = send(&summary, &body).await {
        log::error!("Failed to send notification: {err}");
        log::info!("{summary}: {body}");
    }
}
